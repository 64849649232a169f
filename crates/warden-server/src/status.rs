//! Status rendering.
//!
//! Pure presentation over [`ArbiterSnapshot`]: the status task reads a
//! snapshot on its own cadence and logs the rendering. It can never
//! mutate arbiter state.

use std::fmt::Write as _;

use warden_core::ArbiterSnapshot;

/// Render a snapshot as a multi-line status block.
pub fn render(snapshot: &ArbiterSnapshot) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "------------ arbiter state ------------");
    let _ = writeln!(
        out,
        "resources: {}  clients: {}",
        snapshot.resources.len(),
        snapshot.clients
    );

    for resource in &snapshot.resources {
        match (resource.owner, resource.held_for) {
            (Some(owner), Some(held_for)) => {
                let _ = writeln!(
                    out,
                    "r{} owner={} held_for={:.2}s queue={:?}",
                    resource.id, owner, held_for, resource.queue
                );
            },
            _ => {
                let _ = writeln!(out, "r{} free queue={:?}", resource.id, resource.queue);
            },
        }
    }

    let _ = write!(out, "----------------------------------------");
    out
}
