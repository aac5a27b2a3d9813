//! JSON scene descriptions: the persisted face of a canvas layer.

use easel_core::EaselError;
use easel_geom::{Coord, Point, PolyNode, Shape};
use serde::{Deserialize, Serialize};

use crate::layer::CanvasLayer;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum NodeDesc {
    Corner {
        point: [Coord; 2],
    },
    Arc {
        point: [Coord; 2],
        radius: Coord,
        ccw: bool,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ShapeDesc {
    Segment {
        a: [Coord; 2],
        b: [Coord; 2],
    },
    Arc {
        from: [Coord; 2],
        to: [Coord; 2],
        radius: Coord,
        ccw: bool,
    },
    Circle {
        center: [Coord; 2],
        radius: Coord,
    },
    Polygon {
        points: Vec<[Coord; 2]>,
    },
    ComplexPolygon {
        nodes: Vec<NodeDesc>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObjectDesc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub shape: ShapeDesc,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SceneDesc {
    pub objects: Vec<ObjectDesc>,
}

fn pt(p: [Coord; 2]) -> Point {
    Point::new(p[0], p[1])
}

fn arr(p: Point) -> [Coord; 2] {
    [p.x, p.y]
}

impl ShapeDesc {
    pub fn to_shape(&self) -> Result<Shape, EaselError> {
        Ok(match self {
            ShapeDesc::Segment { a, b } => Shape::segment(pt(*a), pt(*b)),
            ShapeDesc::Arc {
                from,
                to,
                radius,
                ccw,
            } => Shape::arc(pt(*from), pt(*to), *radius, *ccw).ok_or_else(|| {
                EaselError::io(format!(
                    "arc chord {from:?}..{to:?} does not fit radius {radius}"
                ))
            })?,
            ShapeDesc::Circle { center, radius } => Shape::circle(pt(*center), *radius),
            ShapeDesc::Polygon { points } => {
                if points.len() < 3 {
                    return Err(EaselError::io("polygon needs at least 3 points"));
                }
                Shape::polygon(points.iter().map(|&p| pt(p)))
            }
            ShapeDesc::ComplexPolygon { nodes } => {
                if nodes.len() < 2 {
                    return Err(EaselError::io("complex polygon needs at least 2 nodes"));
                }
                Shape::complex_polygon(nodes.iter().map(|n| match n {
                    NodeDesc::Corner { point } => PolyNode::Corner(pt(*point)),
                    NodeDesc::Arc { point, radius, ccw } => PolyNode::Arc {
                        point: pt(*point),
                        radius: *radius,
                        ccw: *ccw,
                    },
                }))
            }
        })
    }

    pub fn from_shape(shape: &Shape) -> ShapeDesc {
        match shape {
            Shape::Segment(s) => ShapeDesc::Segment {
                a: arr(s.a),
                b: arr(s.b),
            },
            Shape::Arc(s) => ShapeDesc::Arc {
                from: arr(s.from),
                to: arr(s.to),
                radius: s.radius,
                ccw: s.range.ccw,
            },
            Shape::Circle(s) => ShapeDesc::Circle {
                center: arr(s.center),
                radius: s.radius,
            },
            Shape::Polygon(s) => ShapeDesc::Polygon {
                points: s.points.iter().map(|&p| arr(p)).collect(),
            },
            Shape::Complex(s) => ShapeDesc::ComplexPolygon {
                nodes: s
                    .nodes
                    .iter()
                    .map(|n| match *n {
                        PolyNode::Corner(p) => NodeDesc::Corner { point: arr(p) },
                        PolyNode::Arc { point, radius, ccw } => NodeDesc::Arc {
                            point: arr(point),
                            radius,
                            ccw,
                        },
                    })
                    .collect(),
            },
        }
    }
}

/// Populate a layer from a JSON scene description.
pub fn load_scene(json: &str, layer: &mut CanvasLayer) -> Result<usize, EaselError> {
    let scene: SceneDesc =
        serde_json::from_str(json).map_err(|e| EaselError::io(format!("bad scene: {e}")))?;
    let count = scene.objects.len();
    for desc in &scene.objects {
        layer.add(desc.shape.to_shape()?, desc.name.clone());
    }
    Ok(count)
}

/// Serialize a layer back into a JSON scene description.
pub fn save_scene(layer: &CanvasLayer) -> Result<String, EaselError> {
    let scene = SceneDesc {
        objects: layer
            .iter()
            .map(|o| ObjectDesc {
                name: o.name.clone(),
                shape: ShapeDesc::from_shape(&o.shape),
            })
            .collect(),
    };
    serde_json::to_string_pretty(&scene).map_err(|e| EaselError::io(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_roundtrip() {
        let mut layer = CanvasLayer::new();
        layer.add(Shape::circle(Point::new(3, 4), 5), Some("dot".into()));
        layer.add(Shape::segment(Point::new(0, 0), Point::new(10, 0)), None);
        layer.add(
            Shape::polygon([Point::new(0, 0), Point::new(4, 0), Point::new(0, 4)]),
            None,
        );
        layer.add(
            Shape::complex_polygon([
                PolyNode::Corner(Point::new(0, 0)),
                PolyNode::Arc {
                    point: Point::new(10, 0),
                    radius: 7,
                    ccw: true,
                },
                PolyNode::Corner(Point::new(10, 10)),
            ]),
            Some("rounded".into()),
        );

        let json = save_scene(&layer).unwrap();
        let mut restored = CanvasLayer::new();
        let n = load_scene(&json, &mut restored).unwrap();
        assert_eq!(n, 4);
        assert_eq!(restored.len(), layer.len());
        for (a, b) in layer.iter().zip(restored.iter()) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.shape, b.shape);
        }
    }

    #[test]
    fn arc_desc_rebuilds_geometry() {
        let desc = ShapeDesc::Arc {
            from: [5, 0],
            to: [0, 5],
            radius: 5,
            ccw: true,
        };
        match desc.to_shape().unwrap() {
            Shape::Arc(arc) => {
                assert_eq!(arc.center, Point::new(0, 0));
                assert_eq!(arc.radius, 5);
            }
            other => panic!("expected arc, got {other:?}"),
        }
    }

    #[test]
    fn invalid_scenes_are_rejected() {
        let mut layer = CanvasLayer::new();
        assert!(load_scene("{not json", &mut layer).is_err());
        // Chord longer than the diameter.
        let bad = r#"{"objects":[{"kind":"arc","from":[0,0],"to":[100,0],"radius":5,"ccw":true}]}"#;
        assert!(load_scene(bad, &mut layer).is_err());
        let flat = r#"{"objects":[{"kind":"polygon","points":[[0,0],[1,1]]}]}"#;
        assert!(load_scene(flat, &mut layer).is_err());
    }
}
