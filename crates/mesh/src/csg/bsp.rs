use super::polygon::{Plane, Polygon, Split};

/// A node of a solid BSP tree.
///
/// Each node keeps the polygons lying in its splitting plane; the front
/// subtree holds everything in front of that plane and the back subtree
/// everything behind it. A missing back child means "solid".
#[derive(Debug, Default)]
pub(crate) struct Node {
    plane: Option<Plane>,
    front: Option<Box<Node>>,
    back: Option<Box<Node>>,
    polygons: Vec<Polygon>,
}

impl Node {
    pub fn new(polygons: Vec<Polygon>) -> Self {
        let mut node = Self::default();
        node.build(polygons);
        node
    }

    /// Turn solid space into empty space and vice versa.
    pub fn invert(&mut self) {
        for polygon in &mut self.polygons {
            polygon.flip();
        }
        if let Some(plane) = &mut self.plane {
            plane.flip();
        }
        if let Some(front) = &mut self.front {
            front.invert();
        }
        if let Some(back) = &mut self.back {
            back.invert();
        }
        std::mem::swap(&mut self.front, &mut self.back);
    }

    /// Remove the parts of `polygons` that lie inside this tree's solid.
    pub fn clip_polygons(&self, polygons: Vec<Polygon>) -> Vec<Polygon> {
        let Some(plane) = self.plane else {
            return polygons;
        };

        let mut front = Vec::new();
        let mut back = Vec::new();
        for polygon in polygons {
            match plane.split(polygon) {
                Split::CoplanarFront(p) | Split::Front(p) => front.push(p),
                Split::CoplanarBack(p) | Split::Back(p) => back.push(p),
                Split::Spanning { front: f, back: b } => {
                    front.extend(f);
                    back.extend(b);
                }
            }
        }

        let mut kept = match &self.front {
            Some(node) => node.clip_polygons(front),
            None => front,
        };
        if let Some(node) = &self.back {
            kept.extend(node.clip_polygons(back));
        }
        kept
    }

    /// Remove every polygon in this tree that lies inside `other`.
    pub fn clip_to(&mut self, other: &Node) {
        self.polygons = other.clip_polygons(std::mem::take(&mut self.polygons));
        if let Some(front) = &mut self.front {
            front.clip_to(other);
        }
        if let Some(back) = &mut self.back {
            back.clip_to(other);
        }
    }

    pub fn all_polygons(&self) -> Vec<Polygon> {
        let mut out = Vec::new();
        self.collect_into(&mut out);
        out
    }

    fn collect_into(&self, out: &mut Vec<Polygon>) {
        out.extend(self.polygons.iter().cloned());
        if let Some(front) = &self.front {
            front.collect_into(out);
        }
        if let Some(back) = &self.back {
            back.collect_into(out);
        }
    }

    /// Insert polygons into the tree, splitting them along existing planes.
    /// The first polygon's plane becomes the splitter of an empty node.
    pub fn build(&mut self, polygons: Vec<Polygon>) {
        let Some(first) = polygons.first() else {
            return;
        };
        let plane = *self.plane.get_or_insert(first.plane);

        let mut front = Vec::new();
        let mut back = Vec::new();
        for polygon in polygons {
            match plane.split(polygon) {
                Split::CoplanarFront(p) | Split::CoplanarBack(p) => self.polygons.push(p),
                Split::Front(p) => front.push(p),
                Split::Back(p) => back.push(p),
                Split::Spanning { front: f, back: b } => {
                    front.extend(f);
                    back.extend(b);
                }
            }
        }

        if !front.is_empty() {
            self.front.get_or_insert_with(Box::default).build(front);
        }
        if !back.is_empty() {
            self.back.get_or_insert_with(Box::default).build(back);
        }
    }

    #[cfg(test)]
    pub fn polygon_count(&self) -> usize {
        self.polygons.len()
            + self.front.as_ref().map_or(0, |n| n.polygon_count())
            + self.back.as_ref().map_or(0, |n| n.polygon_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Vertex;
    use glam::{Vec2, Vec3};

    fn tri_at(z: f32) -> Polygon {
        Polygon::new(vec![
            Vertex::new(Vec3::new(0.0, 0.0, z), Vec3::Z, Vec2::ZERO),
            Vertex::new(Vec3::new(1.0, 0.0, z), Vec3::Z, Vec2::ZERO),
            Vertex::new(Vec3::new(0.0, 1.0, z), Vec3::Z, Vec2::ZERO),
        ])
        .unwrap()
    }

    #[test]
    fn empty_tree_keeps_everything() {
        let tree = Node::new(Vec::new());
        assert_eq!(tree.polygon_count(), 0);
        assert_eq!(tree.clip_polygons(vec![tri_at(0.0)]).len(), 1);
    }

    #[test]
    fn build_keeps_all_polygons() {
        let tree = Node::new(vec![tri_at(0.0), tri_at(1.0), tri_at(-1.0)]);
        assert_eq!(tree.polygon_count(), 3);
        assert_eq!(tree.all_polygons().len(), 3);
    }

    #[test]
    fn clip_discards_polygons_behind_a_solid_leaf() {
        let tree = Node::new(vec![tri_at(0.0)]);
        assert_eq!(tree.clip_polygons(vec![tri_at(1.0)]).len(), 1);
        assert!(tree.clip_polygons(vec![tri_at(-1.0)]).is_empty());
    }

    #[test]
    fn invert_flips_normals() {
        let mut tree = Node::new(vec![tri_at(0.0)]);
        tree.invert();
        let polys = tree.all_polygons();
        assert!(polys[0].plane.normal.abs_diff_eq(Vec3::NEG_Z, 1e-6));
        assert!(polys[0].vertices[0].normal.abs_diff_eq(Vec3::NEG_Z, 1e-6));
        // Behind the flipped plane is now what used to be in front.
        assert!(tree.clip_polygons(vec![tri_at(1.0)]).is_empty());
    }
}
