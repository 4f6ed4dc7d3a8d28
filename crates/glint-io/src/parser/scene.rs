//! Scene assembly: node hierarchy and skeleton binding.

use std::rc::Rc;

use glam::Mat4;
use glint_core::object::{Object3D, ObjectKind, Skeleton};
use glint_core::status::{resolve, GltfError, Result};

use super::{add_unknown_extensions, assign_extras, Dependency, DependencyType, GltfParser, SkinEntry};

/// Resolved nodes and skins a scene is assembled from.
struct SceneParts<'a> {
    parser: &'a GltfParser,
    nodes: &'a [Dependency],
    skins: &'a [Dependency],
}

impl SceneParts<'_> {
    /// Instantiates node `index` and its descendants under a parent with
    /// world transform `parent_world`. `path` holds the ancestors of `index`.
    fn build_node(&self, index: usize, parent_world: Mat4, path: &mut Vec<usize>) -> Result<Object3D> {
        if path.contains(&index) {
            return Err(GltfError::invalid_definition("node", index, "node hierarchy contains a cycle"));
        }
        let node_def = resolve(&self.parser.document.nodes, index, "node")?;
        let mut object = (*resolve(self.nodes, index, "node")?.object()?).clone();
        let world = parent_world * object.matrix();

        if let Some(skin) = node_def.skin {
            let entry = resolve(self.skins, skin, "skin")?.skin()?;
            self.bind_skin(&mut object, &entry, world);
        }

        path.push(index);
        for &child in &node_def.children {
            let child = self.build_node(child, world, path)?;
            object.add(child);
        }
        path.pop();

        Ok(object)
    }

    fn skeleton(&self, entry: &SkinEntry) -> Skeleton {
        let inverses = entry.inverse_bind_matrices.as_ref().map(|attribute| attribute.to_f32_vec());
        let mut skeleton = Skeleton {
            bones: Vec::with_capacity(entry.joints.len()),
            bone_inverses: Vec::with_capacity(entry.joints.len()),
        };

        for (i, &joint) in entry.joints.iter().enumerate() {
            let bone = self.nodes.get(joint).map(Dependency::object);
            let Some(Ok(bone)) = bone else {
                log::warn!("Joint {} could not be found.", joint);
                continue;
            };
            let inverse = inverses
                .as_ref()
                .and_then(|values| values.get(i * 16..i * 16 + 16))
                .map(Mat4::from_cols_slice)
                .unwrap_or(Mat4::IDENTITY);
            skeleton.bones.push(bone.id);
            skeleton.bone_inverses.push(inverse);
        }
        skeleton
    }

    /// Binds the skeleton of `entry` to `object`, or to every mesh directly
    /// under it when it is a group.
    fn bind_skin(&self, object: &mut Object3D, entry: &SkinEntry, world: Mat4) {
        let skeleton = self.skeleton(entry);
        if let Some(mesh) = object.mesh_mut() {
            mesh.bind(skeleton, world);
            return;
        }
        if object.is_group() {
            for child in &mut object.children {
                let bind_matrix = world * child.matrix();
                if let Some(mesh) = child.mesh_mut() {
                    mesh.bind(skeleton.clone(), bind_matrix);
                }
            }
        }
    }
}

impl GltfParser {
    pub(super) async fn load_scene(self: Rc<Self>, index: usize) -> Result<Rc<Object3D>> {
        let scene_def = resolve(&self.document.scenes, index, "scene")?;
        let dependencies = self
            .get_multi_dependencies(&[DependencyType::Node, DependencyType::Skin])
            .await?;
        let resolved = |ty: DependencyType| dependencies.get(&ty).cloned().unwrap_or_default();
        let (nodes, skins) = (resolved(DependencyType::Node), resolved(DependencyType::Skin));

        let parts = SceneParts {
            parser: &self,
            nodes: &nodes,
            skins: &skins,
        };

        let mut scene = Object3D::new(ObjectKind::Scene);
        if let Some(name) = &scene_def.name {
            scene.name = name.clone();
        }
        assign_extras(&mut scene.user_data, scene_def.extras.as_ref());
        add_unknown_extensions(&self.extensions, &mut scene.user_data, &scene_def.extensions);

        let mut path = Vec::new();
        for &node in &scene_def.nodes {
            scene.add(parts.build_node(node, Mat4::IDENTITY, &mut path)?);
        }

        Ok(Rc::new(scene))
    }
}
