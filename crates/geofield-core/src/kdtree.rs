// ─────────────────────────────────────────────────────────────────────
// GeoField — KD-Tree Spatial Index
// ─────────────────────────────────────────────────────────────────────
//! Static KD-tree over a snapshot of a field's center coordinates.
//!
//! Nodes reference centers by index; the tree copies coordinates at
//! build time and records the field's layout revision so callers can
//! detect when it has gone stale. Splits use the axis of greatest
//! spread at each level with a median pivot. Queries use Euclidean
//! coordinate distance and return results ordered by (distance, index),
//! matching a brute-force scan exactly.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use geofield_types::IndexStats;

use crate::field::Field;
use crate::point::Point;

/// Query hit: center index and Euclidean distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub distance: f64,
}

#[derive(Debug, Clone)]
struct Node {
    index: usize,
    axis: usize,
    left: Option<usize>,
    right: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct KdTree {
    dim: usize,
    /// Flattened snapshot, center i at coords[i*dim..(i+1)*dim].
    coords: Vec<f64>,
    nodes: Vec<Node>,
    root: Option<usize>,
    layout_revision: u64,
}

/// Max-heap entry ordered by (squared distance, index).
#[derive(Debug, Clone, Copy)]
struct Candidate {
    dist_sq: f64,
    index: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist_sq
            .total_cmp(&other.dist_sq)
            .then(self.index.cmp(&other.index))
    }
}

impl KdTree {
    /// Build from the field's current center positions.
    pub fn build(field: &Field) -> Self {
        let dim = field.dimension();
        let mut coords = Vec::with_capacity(field.len() * dim);
        for c in field.centers() {
            coords.extend_from_slice(c.point().coords());
        }
        let mut tree = Self {
            dim,
            coords,
            nodes: Vec::with_capacity(field.len()),
            root: None,
            layout_revision: field.layout_revision(),
        };
        let mut order: Vec<usize> = (0..field.len()).collect();
        tree.root = tree.build_recursive(&mut order);
        log::trace!(
            "kd-tree built: {} centers, dim {}, layout revision {}",
            tree.nodes.len(),
            dim,
            tree.layout_revision
        );
        tree
    }

    fn build_recursive(&mut self, indices: &mut [usize]) -> Option<usize> {
        if indices.is_empty() {
            return None;
        }
        let axis = self.widest_axis(indices);
        let mid = indices.len() / 2;
        {
            let coords = &self.coords;
            let dim = self.dim;
            indices.select_nth_unstable_by(mid, |&a, &b| {
                coords[a * dim + axis]
                    .total_cmp(&coords[b * dim + axis])
                    .then(a.cmp(&b))
            });
        }
        let node_id = self.nodes.len();
        self.nodes.push(Node {
            index: indices[mid],
            axis,
            left: None,
            right: None,
        });
        let (lower, rest) = indices.split_at_mut(mid);
        let upper = &mut rest[1..];
        let left = self.build_recursive(lower);
        let right = self.build_recursive(upper);
        self.nodes[node_id].left = left;
        self.nodes[node_id].right = right;
        Some(node_id)
    }

    fn widest_axis(&self, indices: &[usize]) -> usize {
        let mut best_axis = 0;
        let mut best_spread = f64::NEG_INFINITY;
        for axis in 0..self.dim {
            let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
            for &i in indices {
                let v = self.coords[i * self.dim + axis];
                lo = lo.min(v);
                hi = hi.max(v);
            }
            if hi - lo > best_spread {
                best_spread = hi - lo;
                best_axis = axis;
            }
        }
        best_axis
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn layout_revision(&self) -> u64 {
        self.layout_revision
    }

    /// True when the field's centers changed since this tree was built.
    pub fn is_stale(&self, field: &Field) -> bool {
        self.layout_revision != field.layout_revision()
            || self.nodes.len() != field.len()
            || self.dim != field.dimension()
    }

    #[inline]
    fn coord(&self, index: usize, axis: usize) -> f64 {
        self.coords[index * self.dim + axis]
    }

    fn dist_sq(&self, index: usize, q: &[f64]) -> f64 {
        let base = index * self.dim;
        q.iter()
            .enumerate()
            .map(|(k, &v)| {
                let d = self.coords[base + k] - v;
                d * d
            })
            .sum()
    }

    /// The `k` nearest centers ordered by (distance, index).
    pub fn knn(&self, point: &Point, k: usize) -> Vec<Neighbor> {
        if k == 0 || point.dimension() != self.dim {
            return Vec::new();
        }
        let mut heap = BinaryHeap::with_capacity(k + 1);
        if let Some(root) = self.root {
            self.knn_visit(root, point.coords(), k, &mut heap);
        }
        let mut out: Vec<Candidate> = heap.into_vec();
        out.sort();
        out.into_iter()
            .map(|c| Neighbor {
                index: c.index,
                distance: c.dist_sq.sqrt(),
            })
            .collect()
    }

    fn knn_visit(&self, node_id: usize, q: &[f64], k: usize, heap: &mut BinaryHeap<Candidate>) {
        let node = &self.nodes[node_id];
        let cand = Candidate {
            dist_sq: self.dist_sq(node.index, q),
            index: node.index,
        };
        if heap.len() < k {
            heap.push(cand);
        } else if heap.peek().is_some_and(|worst| cand < *worst) {
            heap.pop();
            heap.push(cand);
        }

        let diff = q[node.axis] - self.coord(node.index, node.axis);
        let (near, far) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };
        if let Some(n) = near {
            self.knn_visit(n, q, k, heap);
        }
        if let Some(f) = far {
            let needed = heap.len() < k || heap.peek().is_some_and(|w| diff * diff <= w.dist_sq);
            if needed {
                self.knn_visit(f, q, k, heap);
            }
        }
    }

    /// Every center within `radius` (inclusive), ordered by (distance, index).
    pub fn radius_query(&self, point: &Point, radius: f64) -> Vec<Neighbor> {
        if point.dimension() != self.dim || !(radius >= 0.0) {
            return Vec::new();
        }
        let mut hits = Vec::new();
        if let Some(root) = self.root {
            self.radius_visit(root, point.coords(), radius * radius, &mut hits);
        }
        hits.sort();
        hits.into_iter()
            .map(|c| Neighbor {
                index: c.index,
                distance: c.dist_sq.sqrt(),
            })
            .collect()
    }

    fn radius_visit(&self, node_id: usize, q: &[f64], r_sq: f64, hits: &mut Vec<Candidate>) {
        let node = &self.nodes[node_id];
        let d = self.dist_sq(node.index, q);
        if d <= r_sq {
            hits.push(Candidate {
                dist_sq: d,
                index: node.index,
            });
        }
        let diff = q[node.axis] - self.coord(node.index, node.axis);
        let (near, far) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };
        if let Some(n) = near {
            self.radius_visit(n, q, r_sq, hits);
        }
        if let Some(f) = far {
            if diff * diff <= r_sq {
                self.radius_visit(f, q, r_sq, hits);
            }
        }
    }

    /// Depth and balance statistics.
    pub fn stats(&self) -> IndexStats {
        let n = self.nodes.len();
        if n == 0 {
            return IndexStats::default();
        }
        let mut max_depth = 0usize;
        let mut depth_sum = 0usize;
        let mut stack = vec![];
        if let Some(root) = self.root {
            stack.push((root, 0usize));
        }
        while let Some((id, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            depth_sum += depth;
            let node = &self.nodes[id];
            for child in [node.left, node.right].into_iter().flatten() {
                stack.push((child, depth + 1));
            }
        }
        let ideal = ((n + 1) as f64).log2().ceil();
        IndexStats {
            nodes: n,
            max_depth,
            mean_depth: depth_sum as f64 / n as f64,
            balance: ideal / (max_depth + 1) as f64,
        }
    }
}
