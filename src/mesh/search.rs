//! Banded element search
//!
//! Mesh elements come out of the triangulator in a banded spatial order,
//! so the element containing a query point is usually close in index to
//! the last one found. The search tries the cached hint first, then walks
//! outward in both index directions, rejecting candidates by the cheap
//! centroid-radius test before running the exact predicate.

use std::sync::atomic::Ordering;

use crate::post::PostProcessor;

impl PostProcessor {
    /// Index of the element containing (x, y), or `None` when the point is
    /// outside the meshed region.
    pub fn in_triangle(&self, x: f64, y: f64) -> Option<usize> {
        let sz = self.elements.len();
        if sz == 0 {
            return None;
        }

        let mut k = self.search_hint.load(Ordering::Relaxed);
        if k >= sz {
            k = 0;
        }

        if self.in_triangle_test(x, y, k) {
            self.search_hint.store(k, Ordering::Relaxed);
            return Some(k);
        }

        let mut hi = k;
        let mut lo = k;
        let mut j = 0;
        while j < sz {
            hi += 1;
            if hi >= sz {
                hi = 0;
            }
            lo = if lo == 0 { sz - 1 } else { lo - 1 };

            let e = &self.elements[hi];
            let z = (e.ctr.re - x) * (e.ctr.re - x) + (e.ctr.im - y) * (e.ctr.im - y);
            if z <= e.rsqr && self.in_triangle_test(x, y, hi) {
                self.search_hint.store(hi, Ordering::Relaxed);
                return Some(hi);
            }

            let e = &self.elements[lo];
            let z = (e.ctr.re - x) * (e.ctr.re - x) + (e.ctr.im - y) * (e.ctr.im - y);
            if z <= e.rsqr && self.in_triangle_test(x, y, lo) {
                self.search_hint.store(lo, Ordering::Relaxed);
                return Some(lo);
            }

            j += 2;
        }

        None
    }

    /// Re-locate a sample point given the element that contained the
    /// previous sample: try that element, then its vertex neighbourhood,
    /// then fall back to the full banded search. Contour integration
    /// samples are spatially coherent, so the neighbour ring almost always
    /// hits.
    pub(crate) fn relocate(&self, x: f64, y: f64, last: Option<usize>) -> Option<usize> {
        let elm = match last {
            None => return self.in_triangle(x, y),
            Some(e) => e,
        };
        if self.in_triangle_test(x, y, elm) {
            return Some(elm);
        }
        for j in 0..3 {
            for &cand in &self.adjacency[self.elements[elm].p[j]] {
                if self.in_triangle_test(x, y, cand) {
                    return Some(cand);
                }
            }
        }
        self.in_triangle(x, y)
    }
}
