//! Vertical overlap removal across the whole diagram.

use std::cmp::Ordering;

use super::DiagramNode;

fn horizontally_overlapping(a: &DiagramNode, b: &DiagramNode) -> bool {
    a.right().min(b.right()) - a.left().max(b.left()) > 0.0
}

fn sorted_by_y(nodes: &[DiagramNode]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..nodes.len()).collect();
    order.sort_by(|a, b| {
        nodes[*a]
            .position
            .y
            .partial_cmp(&nodes[*b].position.y)
            .unwrap_or(Ordering::Equal)
    });
    order
}

fn too_close(a: &DiagramNode, b: &DiagramNode, gap: f32) -> bool {
    horizontally_overlapping(a, b) && !(a.bottom() + gap <= b.top() || b.bottom() + gap <= a.top())
}

/// Pushes nodes down until no two horizontally overlapping boxes are closer
/// than `gap` vertically. Only `position.y` is changed, and the slice order
/// is preserved. Returns the number of pushes.
///
/// Manual nodes are anchors: they are separated among themselves first, and
/// an automatic node that lands on one is the node that moves. Automatic
/// nodes are then placed top to bottom, each below every earlier automatic
/// node it overlaps horizontally and clear of every anchor.
pub fn resolve_collisions(nodes: &mut [DiagramNode], gap: f32, iterations: usize) -> usize {
    let mut moved = 0usize;
    for _ in 0..iterations {
        let order = sorted_by_y(nodes);
        let pass_moved = separate_anchors(nodes, &order, gap) + place_automatic(nodes, &order, gap);
        moved += pass_moved;
        if pass_moved == 0 {
            break;
        }
    }
    if moved > 0 {
        log::trace!(moved; "Resolved node collisions");
    }
    moved
}

fn separate_anchors(nodes: &mut [DiagramNode], order: &[usize], gap: f32) -> usize {
    let anchors: Vec<usize> = order.iter().copied().filter(|&i| nodes[i].manual).collect();
    let mut moved = 0usize;
    for (rank, &upper) in anchors.iter().enumerate() {
        for &lower in &anchors[rank + 1..] {
            if !horizontally_overlapping(&nodes[upper], &nodes[lower]) {
                continue;
            }
            let min_y = nodes[upper].bottom() + gap;
            if nodes[lower].position.y < min_y {
                nodes[lower].position.y = min_y;
                moved += 1;
            }
        }
    }
    moved
}

fn place_automatic(nodes: &mut [DiagramNode], order: &[usize], gap: f32) -> usize {
    let anchors: Vec<usize> = order.iter().copied().filter(|&i| nodes[i].manual).collect();
    let mut placed: Vec<usize> = Vec::new();
    let mut moved = 0usize;
    let automatic: Vec<usize> = order.iter().copied().filter(|&i| !nodes[i].manual).collect();
    for idx in automatic {
        // Keep the top-down order of automatic nodes sharing horizontal space.
        let floor = placed
            .iter()
            .filter(|&&other| horizontally_overlapping(&nodes[other], &nodes[idx]))
            .map(|&other| nodes[other].bottom() + gap)
            .fold(f32::NEG_INFINITY, f32::max);
        if nodes[idx].position.y < floor {
            nodes[idx].position.y = floor;
            moved += 1;
        }

        // Each anchor can push at most once since y only grows.
        loop {
            let blocker = anchors
                .iter()
                .copied()
                .find(|&anchor| too_close(&nodes[anchor], &nodes[idx], gap));
            let Some(anchor) = blocker else {
                break;
            };
            nodes[idx].position.y = nodes[anchor].bottom() + gap;
            moved += 1;
        }
        placed.push(idx);
    }
    moved
}

/// Returns the first pair of horizontally overlapping nodes whose vertical
/// extents, widened by `gap`, intersect.
pub fn find_collision(nodes: &[DiagramNode], gap: f32) -> Option<(usize, usize)> {
    for (i, a) in nodes.iter().enumerate() {
        for (j, b) in nodes.iter().enumerate().skip(i + 1) {
            if too_close(a, b, gap) {
                return Some((i, j));
            }
        }
    }
    None
}
