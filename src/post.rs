//! The post-processor: owner of the solved problem and the query facade
//!
//! `PostProcessor` exclusively owns all solution data. Topic-specific
//! operations (field interpolation, integrals, air-gap and circuit
//! queries) are implemented in their own modules as further `impl` blocks
//! on this type; this module holds the struct itself, construction,
//! selection state and the small lookup helpers.

use std::sync::atomic::{AtomicUsize, Ordering};

use num_complex::Complex64;

use crate::config::PostConfig;
use crate::error::{log_sink, WarningSink};
use crate::model::{
    AirGapElement, ArcSegment, BlockLabel, BoundaryProp, Circuit, Material, MeshElement, MeshNode,
    Node, PointProp, Segment,
};
use crate::units::{Coords, LengthUnit, PrevType, ProblemType};

/// Post-processor for one solved 2D magnetics problem
pub struct PostProcessor {
    pub config: PostConfig,
    pub(crate) warn: WarningSink,

    // problem description
    pub(crate) frequency: f64,
    /// Out-of-plane depth, meters (planar problems)
    pub(crate) depth: f64,
    pub(crate) precision: f64,
    pub(crate) length_unit: LengthUnit,
    pub(crate) problem_type: ProblemType,
    pub(crate) coords: Coords,
    pub(crate) comment: String,
    /// Axisymmetric external-region (Kelvin shell) parameters
    pub(crate) ext_zo: f64,
    pub(crate) ext_ro: f64,
    pub(crate) ext_ri: f64,
    pub(crate) prev_soln: String,
    pub(crate) prev_type: PrevType,

    // property tables
    pub(crate) point_props: Vec<PointProp>,
    pub(crate) boundary_props: Vec<BoundaryProp>,
    pub(crate) materials: Vec<Material>,
    pub(crate) circuits: Vec<Circuit>,

    // input geometry
    pub(crate) nodes: Vec<Node>,
    pub(crate) segments: Vec<Segment>,
    pub(crate) arcs: Vec<ArcSegment>,
    pub(crate) labels: Vec<BlockLabel>,

    // solved mesh
    pub(crate) mesh_nodes: Vec<MeshNode>,
    pub(crate) elements: Vec<MeshElement>,
    /// node index -> indices of elements sharing that node
    pub(crate) adjacency: Vec<Vec<usize>>,
    pub(crate) gaps: Vec<AirGapElement>,

    // mutable working state
    pub(crate) contour: Vec<Complex64>,
    /// Last element found by `in_triangle`; successive queries tend to be
    /// spatially coherent, so the banded search starts here
    pub(crate) search_hint: AtomicUsize,
    pub(crate) has_mask: bool,
}

impl Default for PostProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl PostProcessor {
    pub fn new() -> Self {
        Self::with_warning_sink(log_sink())
    }

    /// Build a post-processor routing warnings to the given sink
    pub fn with_warning_sink(warn: WarningSink) -> Self {
        Self {
            config: PostConfig::default(),
            warn,
            frequency: 0.0,
            depth: 1.0 / 0.0254,
            precision: 1.0e-8,
            length_unit: LengthUnit::Inches,
            problem_type: ProblemType::Planar,
            coords: Coords::Cartesian,
            comment: String::new(),
            ext_zo: 0.0,
            ext_ro: 0.0,
            ext_ri: 0.0,
            prev_soln: String::new(),
            prev_type: PrevType::None,
            point_props: Vec::new(),
            boundary_props: Vec::new(),
            materials: Vec::new(),
            circuits: Vec::new(),
            nodes: Vec::new(),
            segments: Vec::new(),
            arcs: Vec::new(),
            labels: Vec::new(),
            mesh_nodes: Vec::new(),
            elements: Vec::new(),
            adjacency: Vec::new(),
            gaps: Vec::new(),
            contour: Vec::new(),
            search_hint: AtomicUsize::new(0),
            has_mask: false,
        }
    }

    /// Close the current solution, releasing everything it owned
    pub fn close(&mut self) {
        self.clear();
    }

    /// Drop all data associated with the current solution
    pub fn clear(&mut self) {
        self.point_props.clear();
        self.boundary_props.clear();
        self.materials.clear();
        self.circuits.clear();
        self.nodes.clear();
        self.segments.clear();
        self.arcs.clear();
        self.labels.clear();
        self.mesh_nodes.clear();
        self.elements.clear();
        self.adjacency.clear();
        self.gaps.clear();
        self.contour.clear();
        self.search_hint.store(0, Ordering::Relaxed);
        self.has_mask = false;
        self.frequency = 0.0;
        self.depth = 1.0;
        self.precision = 1.0e-8;
        self.length_unit = LengthUnit::Inches;
        self.problem_type = ProblemType::Planar;
        self.coords = Coords::Cartesian;
        self.comment.clear();
        self.ext_zo = 0.0;
        self.ext_ro = 0.0;
        self.ext_ri = 0.0;
        self.prev_soln.clear();
        self.prev_type = PrevType::None;
    }

    // ------------------------------------------------------------------
    // Problem metadata
    // ------------------------------------------------------------------

    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.mesh_nodes.len()
    }

    #[inline]
    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Depth in meters (planar problems)
    #[inline]
    pub fn depth(&self) -> f64 {
        self.depth
    }

    #[inline]
    pub fn problem_type(&self) -> ProblemType {
        self.problem_type
    }

    #[inline]
    pub fn length_unit(&self) -> LengthUnit {
        self.length_unit
    }

    #[inline]
    pub fn comment(&self) -> &str {
        &self.comment
    }

    #[inline]
    pub fn precision(&self) -> f64 {
        self.precision
    }

    #[inline]
    pub fn coords(&self) -> Coords {
        self.coords
    }

    /// Path of the previous solution this one is linked to, if any
    #[inline]
    pub fn previous_solution(&self) -> &str {
        &self.prev_soln
    }

    #[inline]
    pub fn prev_type(&self) -> PrevType {
        self.prev_type
    }

    /// Whether the solution carries the Henrotte force weighting mask
    #[inline]
    pub fn has_mask(&self) -> bool {
        self.has_mask
    }

    /// Set the Henrotte virtual-work weighting of one mesh node; the
    /// weighted Maxwell-stress integrals are zero until a mask is set
    pub fn set_node_mask(&mut self, node: usize, msk: f64) {
        if let Some(n) = self.mesh_nodes.get_mut(node) {
            n.msk = msk;
            self.has_mask = self.has_mask || msk != 0.0;
        }
    }

    #[inline]
    pub fn num_circuits(&self) -> usize {
        self.circuits.len()
    }

    #[inline]
    pub fn num_block_labels(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn circuits(&self) -> &[Circuit] {
        &self.circuits
    }

    #[inline]
    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    #[inline]
    pub fn labels(&self) -> &[BlockLabel] {
        &self.labels
    }

    #[inline]
    pub fn point_props(&self) -> &[PointProp] {
        &self.point_props
    }

    #[inline]
    pub fn boundary_props(&self) -> &[BoundaryProp] {
        &self.boundary_props
    }

    /// File-unit to meter conversion factor for this problem
    #[inline]
    pub(crate) fn lc(&self) -> f64 {
        self.length_unit.to_meters()
    }

    #[inline]
    pub(crate) fn is_incremental(&self) -> bool {
        self.prev_type.is_incremental()
    }

    // ------------------------------------------------------------------
    // Geometry lookups
    // ------------------------------------------------------------------

    /// Index of the input-geometry node closest to (x, y)
    pub fn closest_node(&self, x: f64, y: f64) -> Option<usize> {
        if self.nodes.is_empty() {
            return None;
        }
        let mut j = 0;
        let mut d0 = self.nodes[0].distance(x, y);
        for (i, n) in self.nodes.iter().enumerate() {
            let d1 = n.distance(x, y);
            if d1 < d0 {
                d0 = d1;
                j = i;
            }
        }
        Some(j)
    }

    /// Index of the straight segment closest to (x, y)
    pub fn closest_segment(&self, x: f64, y: f64) -> Option<usize> {
        if self.segments.is_empty() {
            return None;
        }
        let mut j = 0;
        let mut d0 = self.shortest_distance_from_segment(x, y, 0);
        for i in 0..self.segments.len() {
            let d1 = self.shortest_distance_from_segment(x, y, i);
            if d1 < d0 {
                d0 = d1;
                j = i;
            }
        }
        Some(j)
    }

    /// Index of the arc segment closest to (x, y)
    pub fn closest_arc_segment(&self, x: f64, y: f64) -> Option<usize> {
        if self.arcs.is_empty() {
            return None;
        }
        let p = Complex64::new(x, y);
        let mut j = 0;
        let mut d0 = self.shortest_distance_from_arc(p, &self.arcs[0]);
        for (i, arc) in self.arcs.iter().enumerate() {
            let d1 = self.shortest_distance_from_arc(p, arc);
            if d1 < d0 {
                d0 = d1;
                j = i;
            }
        }
        Some(j)
    }

    // ------------------------------------------------------------------
    // Selection state
    // ------------------------------------------------------------------

    /// Toggle selection of the block-label region containing (x, y).
    /// Returns the label index if the point is inside the mesh.
    pub fn toggle_block_at(&mut self, x: f64, y: f64) -> Option<usize> {
        let k = self.in_triangle(x, y)?;
        let lbl = self.elements[k].lbl;
        self.labels[lbl].is_selected = !self.labels[lbl].is_selected;
        Some(lbl)
    }

    /// Set the selection flag of one block label
    pub fn select_block_label(&mut self, lbl: usize, selected: bool) {
        if let Some(label) = self.labels.get_mut(lbl) {
            label.is_selected = selected;
        }
    }

    /// Select every block label, segment and arc in a group (group 0
    /// matches everything)
    pub fn select_group(&mut self, group: i32) {
        for label in &mut self.labels {
            if group == 0 || label.in_group == group {
                label.is_selected = true;
            }
        }
        for seg in &mut self.segments {
            if group == 0 || seg.in_group == group {
                seg.is_selected = true;
            }
        }
        for arc in &mut self.arcs {
            if group == 0 || arc.in_group == group {
                arc.is_selected = true;
            }
        }
    }

    /// Clear every selection flag
    pub fn clear_selection(&mut self) {
        for label in &mut self.labels {
            label.is_selected = false;
        }
        for seg in &mut self.segments {
            seg.is_selected = false;
        }
        for arc in &mut self.arcs {
            arc.is_selected = false;
        }
    }

    /// Number of currently selected block labels
    pub fn num_selected_blocks(&self) -> usize {
        self.labels.iter().filter(|l| l.is_selected).count()
    }

    // ------------------------------------------------------------------
    // Contour buffer
    // ------------------------------------------------------------------

    /// Append a point to the integration contour
    pub fn add_contour_point(&mut self, x: f64, y: f64) {
        let p = Complex64::new(x, y);
        if self.contour.last() != Some(&p) {
            self.contour.push(p);
        }
    }

    /// Drop all contour points
    pub fn clear_contour(&mut self) {
        self.contour.clear();
    }

    /// Remove the most recently added contour point
    pub fn erase_contour_point(&mut self) {
        self.contour.pop();
    }

    #[inline]
    pub fn contour(&self) -> &[Complex64] {
        &self.contour
    }
}
