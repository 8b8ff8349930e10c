//! Node-to-element adjacency and boundary-edge detection

use crate::post::PostProcessor;

impl PostProcessor {
    /// Build the node -> element adjacency lists
    pub(crate) fn build_adjacency(&mut self) {
        let mut con = vec![Vec::new(); self.mesh_nodes.len()];
        for (i, e) in self.elements.iter().enumerate() {
            for &n in &e.p {
                con[n].push(i);
            }
        }
        self.adjacency = con;
    }

    /// Mark element edges that no other element shares.
    ///
    /// Edge `j` of an element runs between vertices `p[(j+1)%3]` and
    /// `p[(j+2)%3]`, i.e. the edge opposite vertex `j`.
    pub(crate) fn find_boundary_edges(&mut self) {
        const PLUS1: [usize; 3] = [1, 2, 0];
        const MINUS1: [usize; 3] = [2, 0, 1];

        for i in 0..self.elements.len() {
            for j in 0..3 {
                let org = self.elements[i].p[PLUS1[j]];
                let dest = self.elements[i].p[MINUS1[j]];
                let shared = self.adjacency[org]
                    .iter()
                    .any(|&ei| ei != i && self.elements[ei].p.contains(&dest));
                self.elements[i].boundary_edge[j] = !shared;
            }
        }
    }
}
