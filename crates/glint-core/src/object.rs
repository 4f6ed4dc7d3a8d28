//! Scene graph objects.
//!
//! The scene graph is an owned tree of [`Object3D`] values. Heavy payloads
//! (geometry, materials, textures) are shared through `Rc`, so cloning an
//! object or a whole subtree is cheap. Cloning keeps identities; use
//! [`Object3D::clone_instance`] for a distinct instance.

use std::collections::BTreeMap;
use std::rc::Rc;

use glam::{Mat4, Quat, Vec3};

use crate::constants::DrawMode;
use crate::geometry::Geometry;
use crate::ids::ObjectId;
use crate::material::{Material, RefreshUniforms};
use crate::UserData;

#[derive(Debug, Clone, PartialEq)]
pub struct Object3D {
    pub id: ObjectId,
    pub name: String,
    pub kind: ObjectKind,
    pub position: Vec3,
    pub quaternion: Quat,
    pub scale: Vec3,
    /// Set on nodes targeted by animation channels.
    pub matrix_auto_update: bool,
    pub user_data: UserData,
    pub children: Vec<Object3D>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKind {
    /// Plain transform node.
    Object,
    /// Container for the meshes of a multi-primitive glTF mesh.
    Group,
    /// Root of a glTF scene.
    Scene,
    /// Joint of a skeleton.
    Bone,
    Mesh(Mesh),
    Camera(Camera),
    Light(Light),
}

impl Object3D {
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            id: ObjectId::next(),
            name: String::new(),
            kind,
            position: Vec3::ZERO,
            quaternion: Quat::IDENTITY,
            scale: Vec3::ONE,
            matrix_auto_update: false,
            user_data: UserData::new(),
            children: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn add(&mut self, child: Object3D) {
        self.children.push(child);
    }

    /// Local transform composed from position, rotation and scale.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.quaternion, self.position)
    }

    /// Premultiplies the local transform by `matrix` and decomposes the
    /// result back into position, rotation and scale.
    pub fn apply_matrix(&mut self, matrix: Mat4) {
        let (scale, rotation, translation) = (matrix * self.matrix()).to_scale_rotation_translation();
        self.scale = scale;
        self.quaternion = rotation;
        self.position = translation;
    }

    /// Name used to address the object from animation tracks.
    pub fn target_name(&self) -> String {
        if self.name.is_empty() {
            self.id.to_string()
        } else {
            self.name.clone()
        }
    }

    pub fn is_mesh(&self) -> bool {
        matches!(self.kind, ObjectKind::Mesh(_))
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, ObjectKind::Group)
    }

    pub fn is_bone(&self) -> bool {
        matches!(self.kind, ObjectKind::Bone)
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        match &self.kind {
            ObjectKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn mesh_mut(&mut self) -> Option<&mut Mesh> {
        match &mut self.kind {
            ObjectKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn camera(&self) -> Option<&Camera> {
        match &self.kind {
            ObjectKind::Camera(camera) => Some(camera),
            _ => None,
        }
    }

    pub fn light(&self) -> Option<&Light> {
        match &self.kind {
            ObjectKind::Light(light) => Some(light),
            _ => None,
        }
    }

    /// Visits this object and all descendants depth-first, parents first.
    pub fn traverse<'a>(&'a self, visit: &mut impl FnMut(&'a Object3D)) {
        visit(self);
        for child in &self.children {
            child.traverse(visit);
        }
    }

    pub fn find_by_id(&self, id: ObjectId) -> Option<&Object3D> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find_by_id(id))
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Object3D> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find_by_name(name))
    }

    /// A distinct copy of this subtree: every object gets a fresh identity
    /// and `suffix` appended to its name. Geometry and materials stay
    /// shared.
    pub fn clone_instance(&self, suffix: &str) -> Object3D {
        let mut copy = self.clone();
        copy.reassign(suffix);
        copy
    }

    fn reassign(&mut self, suffix: &str) {
        self.id = ObjectId::next();
        self.name.push_str(suffix);
        for child in &mut self.children {
            child.reassign(suffix);
        }
    }
}

/// Materials bound to a mesh: one, or one per draw group.
#[derive(Debug, Clone, PartialEq)]
pub enum MeshMaterial {
    Single(Rc<Material>),
    Multi(Vec<Rc<Material>>),
}

impl MeshMaterial {
    pub fn materials(&self) -> Vec<&Rc<Material>> {
        match self {
            MeshMaterial::Single(material) => vec![material],
            MeshMaterial::Multi(materials) => materials.iter().collect(),
        }
    }
}

/// Drawable flavour of a mesh object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshKind {
    Mesh,
    SkinnedMesh,
    LineSegments,
    Line,
    LineLoop,
    Points,
}

impl MeshKind {
    pub fn is_line(&self) -> bool {
        matches!(self, MeshKind::LineSegments | MeshKind::Line | MeshKind::LineLoop)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub kind: MeshKind,
    pub draw_mode: DrawMode,
    pub geometry: Rc<Geometry>,
    pub material: MeshMaterial,
    pub morph_target_influences: Vec<f32>,
    pub morph_target_dictionary: BTreeMap<String, usize>,
    pub skeleton: Option<Skeleton>,
    pub bind_matrix: Mat4,
    pub on_before_render: Option<RefreshUniforms>,
}

impl Mesh {
    pub fn new(kind: MeshKind, draw_mode: DrawMode, geometry: Rc<Geometry>, material: MeshMaterial) -> Self {
        Self {
            kind,
            draw_mode,
            geometry,
            material,
            morph_target_influences: Vec::new(),
            morph_target_dictionary: BTreeMap::new(),
            skeleton: None,
            bind_matrix: Mat4::IDENTITY,
            on_before_render: None,
        }
    }

    /// Resets morph influences to zero, one per morph target of the
    /// geometry, and names each target after its attribute.
    pub fn update_morph_targets(&mut self) {
        self.morph_target_influences.clear();
        self.morph_target_dictionary.clear();
        if let Some(targets) = self.geometry.morph_attributes.values().next() {
            for (i, target) in targets.iter().enumerate() {
                let name = match target {
                    crate::attribute::Attribute::Buffer(attribute) if !attribute.name.is_empty() => {
                        attribute.name.clone()
                    }
                    _ => i.to_string(),
                };
                self.morph_target_influences.push(0.0);
                self.morph_target_dictionary.insert(name, i);
            }
        }
    }

    pub fn bind(&mut self, skeleton: Skeleton, bind_matrix: Mat4) {
        self.skeleton = Some(skeleton);
        self.bind_matrix = bind_matrix;
    }
}

/// Bones of a skinned mesh, referenced by object identity, with their
/// inverse bind matrices in joint order.
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    pub bones: Vec<ObjectId>,
    pub bone_inverses: Vec<Mat4>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Camera {
    Perspective {
        /// Vertical field of view in degrees.
        fov: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
    Orthographic {
        left: f32,
        right: f32,
        top: f32,
        bottom: f32,
        near: f32,
        far: f32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    Directional,
    Point,
    Spot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub color: [f32; 3],
    pub intensity: f32,
    /// Cutoff distance; zero means unlimited.
    pub distance: f32,
    pub decay: f32,
    /// Spot cone half angle in radians.
    pub angle: f32,
    pub penumbra: f32,
    /// Local-space point the light aims at, for directional and spot lights.
    pub target: Option<Vec3>,
}

impl Light {
    pub fn new(kind: LightKind, color: [f32; 3]) -> Self {
        let target = match kind {
            LightKind::Point => None,
            LightKind::Directional | LightKind::Spot => Some(Vec3::new(0.0, 0.0, 1.0)),
        };
        Self {
            kind,
            color,
            intensity: 1.0,
            distance: 0.0,
            decay: 1.0,
            angle: std::f32::consts::FRAC_PI_3,
            penumbra: 0.0,
            target,
        }
    }
}

/// Makes a node name safe for animation track paths: whitespace becomes `_`
/// and the reserved characters `[ ] . : /` are removed.
pub fn sanitize_node_name(name: &str) -> String {
    name.chars()
        .filter_map(|c| match c {
            '[' | ']' | '.' | ':' | '/' => None,
            c if c.is_whitespace() => Some('_'),
            c => Some(c),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_node_name() {
        assert_eq!(sanitize_node_name("Left Arm.001"), "Left_Arm001");
        assert_eq!(sanitize_node_name("a[0]:b/c"), "a0bc");
    }

    #[test]
    fn test_apply_matrix_decomposes() {
        let mut node = Object3D::new(ObjectKind::Object);
        let matrix = Mat4::from_scale_rotation_translation(
            Vec3::splat(2.0),
            Quat::from_rotation_y(0.5),
            Vec3::new(1.0, 2.0, 3.0),
        );
        node.apply_matrix(matrix);
        assert!((node.position - Vec3::new(1.0, 2.0, 3.0)).length() < 1e-5);
        assert!((node.scale - Vec3::splat(2.0)).length() < 1e-5);
        assert!(node.matrix().abs_diff_eq(matrix, 1e-5));
    }

    #[test]
    fn test_clone_instance_is_distinct() {
        let mut group = Object3D::new(ObjectKind::Group).with_name("wheel");
        group.add(Object3D::new(ObjectKind::Object).with_name("wheel_0"));
        let copy = group.clone_instance("_instance_1");
        assert_ne!(copy.id, group.id);
        assert_ne!(copy.children[0].id, group.children[0].id);
        assert_eq!(copy.name, "wheel_instance_1");
        assert_eq!(copy.children[0].name, "wheel_0_instance_1");
    }

    #[test]
    fn test_target_name_falls_back_to_id() {
        let node = Object3D::new(ObjectKind::Object);
        assert_eq!(node.target_name(), node.id.to_string());
    }
}
