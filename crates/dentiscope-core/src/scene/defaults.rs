//! The fixed default hierarchy built at scene initialization.
//!
//! | id                 | kind     | parent      |
//! |--------------------|----------|-------------|
//! | `upper-jaw`        | group    | -           |
//! | `lower-jaw`        | group    | -           |
//! | `teeth`            | group    | -           |
//! | `upper-crown`      | mesh     | `teeth`     |
//! | `lower-crown`      | mesh     | `teeth`     |
//! | `upper-pulp`       | mesh     | `teeth`     |
//! | `lower-pulp`       | mesh     | `teeth`     |
//! | `anatomy`          | group    | -           |
//! | `soft-tissue`      | mesh     | `anatomy`   |
//! | `cranial`          | mesh     | `anatomy`   |
//! | `sinus`            | mesh     | `anatomy`   |
//! | `incisive-canal`   | mesh     | `anatomy`   |
//! | `maxilla`          | mesh     | `anatomy`   |
//! | `mandible`         | mesh     | `anatomy`   |
//! | `mandibular-canal` | mesh     | `anatomy`   |
//! | `airways`          | mesh     | `anatomy`   |
//! | `landmarks`        | group    | -           |
//! | `occlusal-plane`   | landmark | `landmarks` |
//! | `midline`          | landmark | `landmarks` |
//!
//! The jaw groups are purely organizational and have no children. Only the
//! `teeth` group drives the rendered model; the other nodes are cosmetic
//! until per-region geometry is bound to them.

use glam::Vec3;

use super::node::{NodeKind, NodeSpec, SceneNode};

pub const UPPER_JAW: &str = "upper-jaw";
pub const LOWER_JAW: &str = "lower-jaw";
pub const TEETH: &str = "teeth";
pub const ANATOMY: &str = "anatomy";
pub const LANDMARKS: &str = "landmarks";

pub const UPPER_CROWN: &str = "upper-crown";
pub const LOWER_CROWN: &str = "lower-crown";
pub const UPPER_PULP: &str = "upper-pulp";
pub const LOWER_PULP: &str = "lower-pulp";

pub const SOFT_TISSUE: &str = "soft-tissue";
pub const CRANIAL: &str = "cranial";
pub const SINUS: &str = "sinus";
pub const INCISIVE_CANAL: &str = "incisive-canal";
pub const MAXILLA: &str = "maxilla";
pub const MANDIBLE: &str = "mandible";
pub const MANDIBULAR_CANAL: &str = "mandibular-canal";
pub const AIRWAYS: &str = "airways";

pub const OCCLUSAL_PLANE: &str = "occlusal-plane";
pub const MIDLINE: &str = "midline";

/// The node whose color, opacity and visibility drive the rendered model.
pub const MODEL_NODE: &str = TEETH;

const ENAMEL: Vec3 = Vec3::new(0.95, 0.93, 0.86);
const PULP: Vec3 = Vec3::new(0.86, 0.36, 0.38);
const BONE: Vec3 = Vec3::new(0.91, 0.88, 0.80);
const NEUTRAL: Vec3 = Vec3::new(0.7, 0.7, 0.7);

fn group(id: &str, name: &str, children: Vec<NodeSpec>) -> NodeSpec {
    NodeSpec::with_children(SceneNode::new(id, name, NodeKind::Group, NEUTRAL), children)
}

fn mesh(id: &str, name: &str, color: Vec3) -> NodeSpec {
    NodeSpec::leaf(SceneNode::new(id, name, NodeKind::Mesh, color))
}

fn landmark(id: &str, name: &str, color: Vec3) -> NodeSpec {
    NodeSpec::leaf(SceneNode::new(id, name, NodeKind::Landmark, color))
}

/// Returns the root specs of the default dental hierarchy, in display order.
#[must_use]
pub fn default_hierarchy() -> Vec<NodeSpec> {
    let mut teeth = group(
        TEETH,
        "Teeth",
        vec![
            mesh(UPPER_CROWN, "Upper Crown", ENAMEL),
            mesh(LOWER_CROWN, "Lower Crown", ENAMEL),
            mesh(UPPER_PULP, "Upper Pulp", PULP),
            mesh(LOWER_PULP, "Lower Pulp", PULP),
        ],
    )
    .expanded(true);
    teeth.node.color = ENAMEL;

    vec![
        group(UPPER_JAW, "Upper Jaw", Vec::new()),
        group(LOWER_JAW, "Lower Jaw", Vec::new()),
        teeth,
        group(
            ANATOMY,
            "Anatomy",
            vec![
                mesh(SOFT_TISSUE, "Soft Tissue", Vec3::new(0.93, 0.68, 0.64)).opacity(0.3),
                mesh(CRANIAL, "Cranial", BONE).opacity(0.5),
                mesh(SINUS, "Sinus", Vec3::new(0.55, 0.78, 0.98)).opacity(0.4),
                mesh(INCISIVE_CANAL, "Incisive Canal", Vec3::new(1.0, 0.6, 0.2)),
                mesh(MAXILLA, "Maxilla", BONE),
                mesh(MANDIBLE, "Mandible", BONE),
                mesh(MANDIBULAR_CANAL, "Mandibular Canal", Vec3::new(1.0, 0.84, 0.2)),
                mesh(AIRWAYS, "Airways", Vec3::new(0.45, 0.68, 0.9)).opacity(0.4),
            ],
        ),
        group(
            LANDMARKS,
            "Landmarks",
            vec![
                landmark(OCCLUSAL_PLANE, "Occlusal Plane", Vec3::new(0.2, 0.8, 0.3)),
                landmark(MIDLINE, "Midline", Vec3::new(0.9, 0.2, 0.2)),
            ],
        ),
    ]
}
