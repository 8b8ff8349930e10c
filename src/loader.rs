//! Solution file loader
//!
//! Parses the line-oriented ASCII solution produced by the solver (format
//! 4.0): header key/value lines, bracketed property blocks, geometry
//! lists, then the `[solution]` marker followed by mesh nodes, elements,
//! circuit results, the periodic-boundary table (read through) and the
//! air-gap element table. After parsing, the load-time derivation pipeline
//! computes everything the query side needs: air-gap harmonics, element
//! centroids and flux densities, magnetization directions, homogenized
//! winding properties, adjacency, nodal smoothing, circuit currents,
//! boundary edges and permanent-magnet energy shifts.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use num_complex::Complex64;

use crate::error::LoadError;
use crate::expr::{self, Binding};
use crate::model::{
    AirGapElement, ArcSegment, BlockLabel, BlockSource, BoundaryProp, Circuit, CircuitKind,
    GapFormat, LamType, Material, MeshElement, MeshNode, Node, PointProp, QuadPoint, Segment,
};
use crate::post::PostProcessor;
use crate::units::{Coords, LengthUnit, PrevType, ProblemType, MU0};

/// Value part of a `[key] = value` or `<key> = value` line
fn strip_key(line: &str) -> &str {
    match line.find('=') {
        Some(idx) => &line[idx + 1..],
        None => match line.find(char::is_whitespace) {
            Some(idx) => &line[idx + 1..],
            None => "",
        },
    }
}

/// Contents between the first and last double quote
fn unquote(s: &str) -> String {
    let first = s.find('"');
    let last = s.rfind('"');
    match (first, last) {
        (Some(a), Some(b)) if b > a => s[a + 1..b].to_string(),
        _ => s.trim().to_string(),
    }
}

fn parse_f64(s: &str, section: &'static str) -> Result<f64, LoadError> {
    s.split_whitespace()
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| LoadError::Malformed {
            section,
            detail: format!("expected a number, got {:?}", s.trim()),
        })
}

fn parse_i64(s: &str, section: &'static str) -> Result<i64, LoadError> {
    s.split_whitespace()
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| LoadError::Malformed {
            section,
            detail: format!("expected an integer, got {:?}", s.trim()),
        })
}

/// Whitespace-delimited fields of a data row
fn fields(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

struct Cursor<'a> {
    lines: &'a [String],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn next(&mut self, section: &'static str) -> Result<&'a str, LoadError> {
        let line = self.lines.get(self.pos).ok_or(LoadError::Truncated(section))?;
        self.pos += 1;
        Ok(line)
    }
}

impl PostProcessor {
    /// Load a solved problem, replacing any currently held solution.
    /// On failure the partial state is cleared.
    pub fn open<P: AsRef<Path>>(&mut self, path: P) -> Result<(), LoadError> {
        let result = self.open_inner(path.as_ref());
        if result.is_err() {
            self.clear();
        }
        result
    }

    fn open_inner(&mut self, path: &Path) -> Result<(), LoadError> {
        self.clear();
        self.depth = -1.0;

        let file = File::open(path).map_err(|e| {
            (self.warn)("couldn't read from specified .ans file");
            LoadError::from(e)
        })?;
        let lines: Vec<String> = BufReader::new(file)
            .lines()
            .collect::<Result<_, std::io::Error>>()?;
        let mut cur = Cursor { lines: &lines, pos: 0 };

        let mut prev_code = 0;
        let mut found_solution = false;

        let mut pprop = PointProp::default();
        let mut bprop = BoundaryProp::default();
        let mut mprop = Material::default();
        let mut cprop = Circuit::default();

        while cur.pos < lines.len() {
            let line = cur.next("header")?;
            let token = match line.split_whitespace().next() {
                Some(t) => t.to_ascii_lowercase(),
                None => continue,
            };

            match token.as_str() {
                "[format]" => {
                    let vers = parse_f64(strip_key(line), "header")?;
                    if (10.0 * vers + 0.5) as i32 != 40 {
                        (self.warn)(
                            "This file is from a different version of the solver.\n\
                             Re-analyze the problem using the current version.",
                        );
                        return Err(LoadError::UnsupportedFormat { found: vers });
                    }
                }
                "[frequency]" => self.frequency = parse_f64(strip_key(line), "header")?,
                "[depth]" => self.depth = parse_f64(strip_key(line), "header")?,
                "[precision]" => self.precision = parse_f64(strip_key(line), "header")?,
                "[lengthunits]" => {
                    if let Some(u) = LengthUnit::parse(strip_key(line)) {
                        self.length_unit = u;
                    }
                }
                "[problemtype]" => {
                    let v = strip_key(line).trim().to_ascii_lowercase();
                    if v.starts_with("planar") {
                        self.problem_type = ProblemType::Planar;
                    } else if v.starts_with("axi") {
                        self.problem_type = ProblemType::Axisymmetric;
                    }
                }
                "[coordinates]" => {
                    let v = strip_key(line).trim().to_ascii_lowercase();
                    if v.starts_with("cart") {
                        self.coords = Coords::Cartesian;
                    } else if v.starts_with("polar") {
                        self.coords = Coords::Polar;
                    }
                }
                "[comment]" => {
                    self.comment = unquote(strip_key(line)).replace("\\n", "\r\n");
                }
                "[extzo]" => self.ext_zo = parse_f64(strip_key(line), "header")?,
                "[extro]" => self.ext_ro = parse_f64(strip_key(line), "header")?,
                "[extri]" => self.ext_ri = parse_f64(strip_key(line), "header")?,
                "[prevsoln]" => self.prev_soln = unquote(strip_key(line)),
                "[prevtype]" => prev_code = parse_i64(strip_key(line), "header")? as i32,

                // ---- point properties ----
                "<beginpoint>" => pprop = PointProp::default(),
                "<pointname>" => pprop.name = unquote(strip_key(line)),
                "<a_re>" => pprop.a.re = parse_f64(strip_key(line), "point property")?,
                "<a_im>" => pprop.a.im = parse_f64(strip_key(line), "point property")?,
                "<i_re>" => pprop.j.re = parse_f64(strip_key(line), "point property")?,
                "<i_im>" => pprop.j.im = parse_f64(strip_key(line), "point property")?,
                "<endpoint>" => self.point_props.push(std::mem::take(&mut pprop)),

                // ---- boundary properties ----
                "<beginbdry>" => bprop = BoundaryProp::default(),
                "<bdryname>" => bprop.name = unquote(strip_key(line)),
                "<bdrytype>" => bprop.format = parse_i64(strip_key(line), "boundary")? as i32,
                "<mu_ssd>" => bprop.mu = parse_f64(strip_key(line), "boundary")?,
                "<sigma_ssd>" => bprop.sig = parse_f64(strip_key(line), "boundary")?,
                "<a_0>" => bprop.a0 = parse_f64(strip_key(line), "boundary")?,
                "<a_1>" => bprop.a1 = parse_f64(strip_key(line), "boundary")?,
                "<a_2>" => bprop.a2 = parse_f64(strip_key(line), "boundary")?,
                "<phi>" => bprop.phi = parse_f64(strip_key(line), "boundary")?,
                "<c0>" => bprop.c0.re = parse_f64(strip_key(line), "boundary")?,
                "<c0i>" => bprop.c0.im = parse_f64(strip_key(line), "boundary")?,
                "<c1>" => bprop.c1.re = parse_f64(strip_key(line), "boundary")?,
                "<c1i>" => bprop.c1.im = parse_f64(strip_key(line), "boundary")?,
                "<endbdry>" => self.boundary_props.push(std::mem::take(&mut bprop)),

                // ---- block properties (materials) ----
                "<beginblock>" => mprop = Material::default(),
                "<blockname>" => mprop.name = unquote(strip_key(line)),
                "<mu_x>" => mprop.mu_x = parse_f64(strip_key(line), "material")?,
                "<mu_y>" => mprop.mu_y = parse_f64(strip_key(line), "material")?,
                "<h_c>" => mprop.h_c = parse_f64(strip_key(line), "material")?,
                "<j_re>" => mprop.j.re = parse_f64(strip_key(line), "material")?,
                "<j_im>" => {
                    if self.frequency != 0.0 {
                        mprop.j.im = parse_f64(strip_key(line), "material")?;
                    }
                }
                "<sigma>" => mprop.cduct = parse_f64(strip_key(line), "material")?,
                "<phi_h>" => mprop.theta_hn = parse_f64(strip_key(line), "material")?,
                "<phi_hx>" => mprop.theta_hx = parse_f64(strip_key(line), "material")?,
                "<phi_hy>" => mprop.theta_hy = parse_f64(strip_key(line), "material")?,
                "<d_lam>" => mprop.lam_d = parse_f64(strip_key(line), "material")?,
                "<lamfill>" => mprop.lam_fill = parse_f64(strip_key(line), "material")?,
                "<lamtype>" => {
                    mprop.lam_type =
                        LamType::from_code(parse_i64(strip_key(line), "material")? as i32)
                }
                "<nstrands>" => {
                    mprop.n_strands = parse_i64(strip_key(line), "material")? as i32
                }
                "<wired>" => mprop.wire_d = parse_f64(strip_key(line), "material")?,
                "<bhpoints>" => {
                    let n = parse_i64(strip_key(line), "material")? as usize;
                    mprop.b_data.clear();
                    mprop.h_data.clear();
                    for _ in 0..n {
                        let row = cur.next("B-H table")?;
                        let f = fields(row);
                        if f.len() < 2 {
                            return Err(LoadError::Malformed {
                                section: "B-H table",
                                detail: format!("expected B and H, got {:?}", row.trim()),
                            });
                        }
                        mprop.b_data.push(parse_f64(f[0], "B-H table")?);
                        mprop.h_data.push(parse_f64(f[1], "B-H table")?);
                    }
                }
                "<endblock>" => {
                    let incremental = !self.prev_soln.is_empty() && prev_code != 0;
                    if mprop.bh_points() > 0 {
                        if incremental {
                            // first pass just extracts the AC-curve MuMax
                            mprop.get_slopes(self.frequency * 2.0 * std::f64::consts::PI);
                            mprop.clear_slopes();
                            if prev_code == 1 && self.frequency == 0.0 {
                                mprop.mu_max = 1.0;
                            }
                            // second pass builds the DC curve
                            mprop.get_slopes(0.0);
                        } else {
                            mprop.get_slopes(self.frequency * 2.0 * std::f64::consts::PI);
                            mprop.mu_max = 0.0;
                        }
                    }
                    self.materials.push(std::mem::take(&mut mprop));
                }

                // ---- circuit properties ----
                "<begincircuit>" => cprop = Circuit::default(),
                "<circuitname>" => cprop.name = unquote(strip_key(line)),
                "<totalamps_re>" => {
                    cprop.amps.re += parse_f64(strip_key(line), "circuit")?;
                }
                "<totalamps_im>" => {
                    if self.frequency != 0.0 {
                        cprop.amps.im += parse_f64(strip_key(line), "circuit")?;
                    }
                }
                "<circuittype>" => {
                    cprop.kind =
                        CircuitKind::from_code(parse_i64(strip_key(line), "circuit")? as i32)
                }
                "<endcircuit>" => self.circuits.push(std::mem::take(&mut cprop)),

                // ---- geometry lists ----
                "[numpoints]" => {
                    let n = parse_i64(strip_key(line), "points")? as usize;
                    for _ in 0..n {
                        let row = cur.next("points")?;
                        let f = fields(row);
                        if f.len() < 3 {
                            return Err(LoadError::Malformed {
                                section: "points",
                                detail: row.trim().to_string(),
                            });
                        }
                        let mut node = Node::default();
                        node.pos.x = parse_f64(f[0], "points")?;
                        node.pos.y = parse_f64(f[1], "points")?;
                        let marker = parse_i64(f[2], "points")? - 1;
                        node.boundary_marker = usize::try_from(marker).ok();
                        self.nodes.push(node);
                    }
                }
                "[numsegments]" => {
                    let n = parse_i64(strip_key(line), "segments")? as usize;
                    for _ in 0..n {
                        let row = cur.next("segments")?;
                        let f = fields(row);
                        if f.len() < 6 {
                            return Err(LoadError::Malformed {
                                section: "segments",
                                detail: row.trim().to_string(),
                            });
                        }
                        let marker = parse_i64(f[3], "segments")? - 1;
                        self.segments.push(Segment {
                            n0: parse_i64(f[0], "segments")? as usize,
                            n1: parse_i64(f[1], "segments")? as usize,
                            max_side_length: parse_f64(f[2], "segments")?,
                            boundary_marker: usize::try_from(marker).ok(),
                            hidden: parse_i64(f[4], "segments")? != 0,
                            in_group: parse_i64(f[5], "segments")? as i32,
                            is_selected: false,
                        });
                    }
                }
                "[numarcsegments]" => {
                    let n = parse_i64(strip_key(line), "arc segments")? as usize;
                    for _ in 0..n {
                        let row = cur.next("arc segments")?;
                        let f = fields(row);
                        if f.len() < 8 {
                            return Err(LoadError::Malformed {
                                section: "arc segments",
                                detail: row.trim().to_string(),
                            });
                        }
                        let marker = parse_i64(f[4], "arc segments")? - 1;
                        let mut arc = ArcSegment {
                            n0: parse_i64(f[0], "arc segments")? as usize,
                            n1: parse_i64(f[1], "arc segments")? as usize,
                            arc_length: parse_f64(f[2], "arc segments")?,
                            max_side_length: parse_f64(f[3], "arc segments")?,
                            boundary_marker: usize::try_from(marker).ok(),
                            hidden: parse_i64(f[5], "arc segments")? != 0,
                            in_group: parse_i64(f[6], "arc segments")? as i32,
                            is_selected: false,
                        };
                        // prefer the as-meshed side length when recorded
                        let as_meshed = parse_f64(f[7], "arc segments")?;
                        if as_meshed > 0.0 {
                            arc.max_side_length = as_meshed;
                        }
                        self.arcs.push(arc);
                    }
                }
                "[numholes]" => {
                    let n = parse_i64(strip_key(line), "holes")? as usize;
                    for _ in 0..n {
                        cur.next("holes")?;
                    }
                }
                "[numblocklabels]" => {
                    let n = parse_i64(strip_key(line), "block labels")? as usize;
                    for _ in 0..n {
                        let row = cur.next("block labels")?;
                        let f = fields(row);
                        if f.len() < 9 {
                            return Err(LoadError::Malformed {
                                section: "block labels",
                                detail: row.trim().to_string(),
                            });
                        }
                        let block_type = parse_i64(f[2], "block labels")? - 1;
                        if block_type < 0 {
                            return Err(LoadError::Malformed {
                                section: "block labels",
                                detail: format!("label has no material: {:?}", row.trim()),
                            });
                        }
                        let mut max_area = parse_f64(f[3], "block labels")?;
                        max_area = if max_area < 0.0 {
                            0.0
                        } else {
                            std::f64::consts::PI * max_area * max_area / 4.0
                        };
                        let in_circuit = parse_i64(f[4], "block labels")? - 1;
                        let ext_flags = parse_i64(f[8], "block labels")?;

                        // anything after the nine numeric fields is the
                        // magnetization-direction expression
                        let expr_part = {
                            let mut rest = row;
                            for _ in 0..9 {
                                rest = rest.trim_start();
                                match rest.find(char::is_whitespace) {
                                    Some(idx) => rest = &rest[idx..],
                                    None => {
                                        rest = "";
                                        break;
                                    }
                                }
                            }
                            let rest = rest.trim();
                            if rest.is_empty() {
                                String::new()
                            } else {
                                unquote(rest)
                            }
                        };

                        self.labels.push(BlockLabel {
                            x: parse_f64(f[0], "block labels")?,
                            y: parse_f64(f[1], "block labels")?,
                            block_type: block_type as usize,
                            max_area,
                            in_circuit: usize::try_from(in_circuit).ok(),
                            mag_dir: parse_f64(f[5], "block labels")?,
                            mag_dir_expr: expr_part,
                            in_group: parse_i64(f[6], "block labels")? as i32,
                            turns: parse_i64(f[7], "block labels")? as i32,
                            is_external: ext_flags & 1 != 0,
                            is_default: ext_flags & 2 != 0,
                            is_selected: false,
                            source: BlockSource::None,
                            fill_factor: -1.0,
                            o: Complex64::new(0.0, 0.0),
                            mu: Complex64::new(0.0, 0.0),
                        });
                    }
                }

                "[solution]" => {
                    found_solution = true;
                    break;
                }

                _ => {}
            }
        }

        if !found_solution {
            (self.warn)("No solution found in file.");
            return Err(LoadError::NoSolution);
        }

        self.prev_type = if self.prev_soln.is_empty() {
            PrevType::None
        } else {
            PrevType::from_code(prev_code)
        };
        let incremental = self.is_incremental();

        // ---- mesh nodes ----
        let n_nodes = parse_i64(cur.next("mesh nodes")?, "mesh nodes")? as usize;
        self.mesh_nodes.reserve(n_nodes);
        for i in 0..n_nodes {
            let row = cur.next("mesh nodes")?;
            let f = fields(row);
            let expected = match (self.frequency != 0.0, incremental) {
                (true, false) => 4,
                (true, true) => 6,
                (false, false) => 3,
                (false, true) => 5,
            };
            if f.len() != expected {
                let msg = format!(
                    "An error occurred while reading the mesh nodes section, wrong number of \
                     inputs ({}) for node {} (expected {}).",
                    f.len(),
                    i,
                    expected
                );
                (self.warn)(&msg);
                return Err(LoadError::WrongArity {
                    section: "mesh nodes",
                    index: i,
                    found: f.len(),
                    expected,
                });
            }
            let mut node = MeshNode::default();
            node.pos.x = parse_f64(f[0], "mesh nodes")?;
            node.pos.y = parse_f64(f[1], "mesh nodes")?;
            node.a.re = parse_f64(f[2], "mesh nodes")?;
            if self.frequency != 0.0 {
                node.a.im = parse_f64(f[3], "mesh nodes")?;
                if incremental {
                    node.a_prev = parse_f64(f[5], "mesh nodes")?;
                }
            } else if incremental {
                node.a_prev = parse_f64(f[4], "mesh nodes")?;
            }
            self.mesh_nodes.push(node);
        }

        // ---- mesh elements ----
        let n_elems = parse_i64(cur.next("mesh elements")?, "mesh elements")? as usize;
        self.elements.reserve(n_elems);
        for i in 0..n_elems {
            let row = cur.next("mesh elements")?;
            let f = fields(row);
            let expected = if incremental { 5 } else { 4 };
            if f.len() != expected {
                let msg = format!(
                    "An error occurred while reading the mesh elements section, wrong number of \
                     inputs ({}) for element {} (expected {}).",
                    f.len(),
                    i,
                    expected
                );
                (self.warn)(&msg);
                return Err(LoadError::WrongArity {
                    section: "mesh elements",
                    index: i,
                    found: f.len(),
                    expected,
                });
            }
            let mut e = MeshElement {
                p: [
                    parse_i64(f[0], "mesh elements")? as usize,
                    parse_i64(f[1], "mesh elements")? as usize,
                    parse_i64(f[2], "mesh elements")? as usize,
                ],
                lbl: parse_i64(f[3], "mesh elements")? as usize,
                ..MeshElement::default()
            };
            if incremental {
                e.j_prev = parse_f64(f[4], "mesh elements")?;
            }
            e.blk = self.labels[e.lbl].block_type;
            self.elements.push(e);
        }

        // ---- circuit result rows ----
        let n_circ_rows = parse_i64(cur.next("circuit results")?, "circuit results")? as usize;
        for i in 0..n_circ_rows {
            let row = cur.next("circuit results")?;
            let f = fields(row);
            let case = parse_i64(f[0], "circuit results")?;
            let value = if self.frequency == 0.0 {
                Complex64::new(parse_f64(f[1], "circuit results")?, 0.0)
            } else {
                Complex64::new(
                    parse_f64(f[1], "circuit results")?,
                    parse_f64(f[2], "circuit results")?,
                )
            };
            if let Some(label) = self.labels.get_mut(i) {
                label.source = if case == 0 {
                    BlockSource::Voltage(value)
                } else {
                    BlockSource::Current(value)
                };
            }
        }

        // ---- periodic boundary conditions: read through, not used ----
        if let Ok(line) = cur.next("periodic boundary conditions") {
            let n = parse_i64(line, "periodic boundary conditions")? as usize;
            for _ in 0..n {
                cur.next("periodic boundary conditions")?;
            }
        }

        // ---- air gap elements ----
        if let Ok(line) = cur.next("air gap elements") {
            let n = parse_i64(line, "air gap elements")? as usize;
            for _ in 0..n {
                let name = cur.next("air gap elements")?.replace('"', "");
                let name = name.trim().to_string();

                let row = cur.next("air gap elements")?;
                let f = fields(row);
                if f.len() < 11 {
                    return Err(LoadError::Malformed {
                        section: "air gap elements",
                        detail: row.trim().to_string(),
                    });
                }
                let mut age = AirGapElement {
                    name,
                    format: if parse_i64(f[0], "air gap elements")? == 0 {
                        GapFormat::Periodic
                    } else {
                        GapFormat::Antiperiodic
                    },
                    inner_angle: parse_f64(f[1], "air gap elements")?,
                    outer_angle: parse_f64(f[2], "air gap elements")?,
                    ri: parse_f64(f[3], "air gap elements")? * self.lc(),
                    ro: parse_f64(f[4], "air gap elements")? * self.lc(),
                    total_arc_length: parse_f64(f[5], "air gap elements")?,
                    agc: Complex64::new(
                        parse_f64(f[6], "air gap elements")?,
                        parse_f64(f[7], "air gap elements")?,
                    ),
                    arc_elements: parse_i64(f[8], "air gap elements")?.max(0) as usize,
                    inner_shift: parse_f64(f[9], "air gap elements")?,
                    outer_shift: parse_f64(f[10], "air gap elements")?,
                    ..AirGapElement::default()
                };

                age.quad_points.reserve(age.arc_elements + 1);
                for pad in 0..=age.arc_elements {
                    let row = cur.next("air gap elements")?;
                    let f = fields(row);
                    if f.len() < 8 {
                        return Err(LoadError::Malformed {
                            section: "air gap elements",
                            detail: row.trim().to_string(),
                        });
                    }
                    let n = [
                        parse_i64(f[0], "air gap elements")?,
                        parse_i64(f[2], "air gap elements")?,
                        parse_i64(f[4], "air gap elements")?,
                        parse_i64(f[6], "air gap elements")?,
                    ];
                    if n.iter().any(|&v| v < 0) {
                        let msg = format!(
                            "An error occurred while reading the input file: air gap pad {} \
                             references a negative node number ({} {} {} {}).",
                            pad, n[0], n[1], n[2], n[3]
                        );
                        (self.warn)(&msg);
                        return Err(LoadError::NegativeQuadNode {
                            pad,
                            n0: n[0],
                            n1: n[1],
                            n2: n[2],
                            n3: n[3],
                        });
                    }
                    age.quad_points.push(QuadPoint {
                        n0: n[0] as usize,
                        w0: parse_f64(f[1], "air gap elements")?,
                        n1: n[1] as usize,
                        w1: parse_f64(f[3], "air gap elements")?,
                        n2: n[2] as usize,
                        w2: parse_f64(f[5], "air gap elements")?,
                        n3: n[3] as usize,
                        w3: parse_f64(f[7], "air gap elements")?,
                    });
                }

                if age.arc_elements > 0 {
                    self.gaps.push(age);
                }
            }
        }

        self.derive();
        Ok(())
    }

    /// Everything computed from the raw solution after parsing, in an
    /// order where each step only depends on the ones before it
    fn derive(&mut self) {
        // air-gap harmonics come straight off the nodal potentials
        self.compute_gap_harmonics();

        // depth to meters (planar problems without a depth get 1 m)
        if self.depth == -1.0 {
            self.depth = 1.0;
        } else {
            self.depth *= self.lc();
        }

        // centroids and search radii
        for i in 0..self.elements.len() {
            let c = self.ctr(i);
            self.elements[i].ctr = c;
            let mut rsqr = 0.0_f64;
            for j in 0..3 {
                let n = &self.mesh_nodes[self.elements[i].p[j]];
                let d = (n.pos.x - c.re).powi(2) + (n.pos.y - c.im).powi(2);
                rsqr = rsqr.max(d);
            }
            self.elements[i].rsqr = rsqr;
        }

        // magnetization direction, numeric or an expression evaluated at
        // the element centroid
        for i in 0..self.elements.len() {
            let label = &self.labels[self.elements[i].lbl];
            if label.mag_dir_expr.is_empty() {
                self.elements[i].magdir = label.mag_dir;
            } else {
                let ctr = self.elements[i].ctr;
                let bindings = [
                    Binding { name: "x", value: ctr.re },
                    Binding { name: "y", value: ctr.im },
                    Binding { name: "r", value: ctr.re },
                    Binding { name: "z", value: ctr.im },
                    Binding {
                        name: "theta",
                        value: ctr.arg() * 180.0 / std::f64::consts::PI,
                    },
                    Binding { name: "R", value: ctr.norm() },
                ];
                match expr::eval(&label.mag_dir_expr, &bindings) {
                    Ok(v) => self.elements[i].magdir = v,
                    Err(e) => {
                        (self.warn)(&format!(
                            "bad magnetization direction expression {:?}: {}",
                            label.mag_dir_expr, e
                        ));
                        self.elements[i].magdir = 0.0;
                    }
                }
            }
        }

        // element flux densities
        for i in 0..self.elements.len() {
            self.compute_element_b(i);
        }

        // frequency-dependent permeability of linear laminated materials
        if self.frequency != 0.0 {
            let f = self.frequency;
            for mat in &mut self.materials {
                mat.compute_fd_permeability(f);
            }
        }

        // homogenized winding properties per label
        for lbl in 0..self.labels.len() {
            self.compute_fill_factor(lbl);
        }

        self.build_adjacency();

        // nodal smoothing needs the adjacency and material data
        self.smooth_all();

        // total current of circuits with a prescribed voltage gradient
        for c in 0..self.circuits.len() {
            if self.circuits[c].kind != CircuitKind::PrescribedCurrent {
                continue;
            }
            let mut amps = Complex64::new(0.0, 0.0);
            for i in 0..self.elements.len() {
                if self.labels[self.elements[i].lbl].in_circuit != Some(c) {
                    continue;
                }
                let (_javg, j, _a) = self.get_ja(i);
                let a = self.elm_area(i) * self.lc() * self.lc();
                for &jk in &j {
                    amps += a * jk / 3.0;
                }
            }
            self.circuits[c].amps = amps;
        }

        self.find_boundary_edges();

        // regions tagged by more than one block label
        let mut warned = false;
        for k in 0..self.labels.len() {
            let (x, y) = (self.labels[k].x, self.labels[k].y);
            if let Some(i) = self.in_triangle(x, y) {
                let tagged = self.elements[i].lbl;
                if tagged != k {
                    self.labels[tagged].is_selected = true;
                    self.labels[k].is_selected = true;
                    if !warned {
                        (self.warn)(&format!(
                            "Some regions in the problem have been defined by more than one \
                             block label.\nThe offending labels are numbers {} and {} with \
                             block types {:?} and {:?}, at ({}, {}) and ({}, {}).",
                            k,
                            tagged,
                            self.materials[self.labels[k].block_type].name,
                            self.materials[self.labels[tagged].block_type].name,
                            self.labels[k].x,
                            self.labels[k].y,
                            self.labels[tagged].x,
                            self.labels[tagged].y,
                        ));
                        warned = true;
                    }
                }
            }
        }

        // stored-energy shift of nonlinear permanent magnets
        if self.frequency == 0.0 {
            for mat in &mut self.materials {
                if mat.h_c > 0.0 && mat.bh_points() > 0 {
                    mat.nrg = mat.get_coenergy(mat.get_b(mat.h_c));
                }
            }
        }

        // Henrotte weighting mask presence
        self.has_mask = self.mesh_nodes.iter().any(|n| n.msk != 0.0);
    }

    /// Fill factor and homogenized effective conductivity/permeability of
    /// one block label. Solid regions keep `fill_factor = -1`; wound
    /// regions (magnet wire, stranded, litz, foil) get the closed-form
    /// skin/proximity fits.
    pub(crate) fn compute_fill_factor(&mut self, lbl: usize) {
        let mat = self.materials[self.labels[lbl].block_type].clone();
        let lc2 = self.lc() * self.lc();
        let pi = std::f64::consts::PI;
        let i = Complex64::i();

        // defaults
        {
            let label = &mut self.labels[lbl];
            label.fill_factor = if label.turns.abs() > 1 { 1.0 } else { -1.0 };
            label.o = Complex64::from(mat.cduct);
            label.mu = Complex64::new(0.0, 0.0);
        }

        if !mat.lam_type.is_wound() {
            return;
        }

        let mut atot = 0.0;
        for e in 0..self.elements.len() {
            if self.elements[e].lbl == lbl {
                atot += self.elm_area(e) * lc2;
            }
        }
        if atot == 0.0 {
            return;
        }

        let turns = self.labels[lbl].turns as f64;

        if mat.lam_type == LamType::RectFoil {
            let w = 2.0 * pi * self.frequency;
            let d = mat.wire_d * 0.001;
            let ff = (d * d * turns / atot).abs();
            let dd = d / ff.sqrt(); // foil pitch
            let fill = d / dd;
            let o = mat.cduct * (d / dd) * 1.0e6; // effective foil conductivity, S/m

            let label = &mut self.labels[lbl];
            label.fill_factor = ff;

            if self.frequency == 0.0 {
                // the imaginary part stores the local stored-energy
                // coefficient used by the energy integrals
                label.o = Complex64::new(mat.cduct * ff, (dd - d) * dd * MU0 / 6.0);
                label.mu = Complex64::from(1.0);
                return;
            }

            if o != 0.0 {
                let kw = (i * w * o * MU0).sqrt() * d / 2.0;
                let ufd = MU0 * kw.tanh() / kw;
                let ueff = fill * ufd + (1.0 - fill) * MU0;
                let mut oeff = 1.0
                    / (MU0 / (fill * o * ufd) + i * dd * dd * (1.0 - fill) * MU0 * w / 4.0
                        - i * dd * dd * ueff * w / 12.0);
                oeff *= 1.0e-6; // MS/m
                label.o = oeff;
                label.mu = ueff / MU0;
            } else {
                // current with zero conductivity: idealize with an
                // imaginary conductivity carrying the local stored energy
                label.mu = Complex64::from(1.0);
                label.o = 6.0 / (i * w * (dd - d) * dd * MU0);
            }
            return;
        }

        // round wires
        let (radius, awire) = match mat.lam_type {
            LamType::MagnetWire => {
                let r = mat.wire_d * 0.0005;
                (r, pi * r * r * mat.n_strands as f64 * turns)
            }
            LamType::Stranded => {
                let r = mat.wire_d * 0.0005 * (mat.n_strands as f64).sqrt();
                (r, pi * r * r * turns)
            }
            LamType::Litz => {
                let r = mat.wire_d * 0.0005;
                (r, pi * r * r * mat.n_strands as f64 * turns)
            }
            _ => unreachable!(),
        };

        let fill = (awire / atot).abs();
        self.labels[lbl].fill_factor = fill;

        let w = 2.0 * pi * self.frequency;
        let o = mat.cduct * 1.0e6; // S/m
        let big_w = w * o * MU0 * radius * radius / 2.0; // non-dimensional frequency
        let dd = 1.6494541661869013 * radius / fill.sqrt(); // equivalent foil pitch

        let label = &mut self.labels[lbl];

        if self.frequency == 0.0 {
            label.o = Complex64::new(
                mat.cduct * fill,
                0.5 * MU0 * radius * radius * (1.5299240194394943 / fill.sqrt()).ln() / fill
                    - MU0 * dd * dd / 12.0,
            );
            label.mu = Complex64::from(1.0);
            return;
        }

        if mat.cduct == 0.0 {
            label.o = 1.0
                / ((i / 2.0) * w * MU0 * radius * radius
                    * (1.5299240194394943 / fill.sqrt()).ln()
                    / fill
                    - (i / 12.0) * MU0 * dd * dd);
            label.mu = Complex64::from(1.0);
            return;
        }

        // fit for the frequency-dependent permeability
        let c1 = 0.7756067409818643
            + fill * (0.6873854335408803 + fill * (0.06841584481674128 - 0.07143732702512284 * fill));
        let c2 = 1.5 * fill / c1;
        let arg = (c1 * i * big_w).sqrt();
        let ufd = c2 * (arg.tanh() / arg) + (1.0 - c2);
        label.mu = ufd;

        // fit for the frequency-dependent conductivity
        let c3 = 0.8824642871525136
            + fill * (-0.008605512994838827 + fill * (0.7223208744682307 - 0.2157183942377177 * fill));
        let c4 = (1.5299240194394943 / fill.sqrt()).ln() - c3 / 3.0;
        let arg = (c3 * i * big_w).sqrt();
        let mut ofd = o * fill / (i * c4 * big_w + arg / arg.tanh());
        // keep the local stored energy from being double-booked
        ofd = 1.0 / (1.0 / ofd - i * w * ufd * MU0 * dd * dd / 12.0);
        label.o = ofd * 1.0e-6;
    }
}
