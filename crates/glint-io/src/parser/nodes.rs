//! Nodes, cameras and skins.

use std::rc::Rc;

use glam::{Mat4, Quat, Vec3};
use glint_core::object::{sanitize_node_name, Camera, Object3D, ObjectKind};
use glint_core::status::{resolve, Result};

use super::{add_unknown_extensions, assign_extras, DependencyType, GltfParser, SkinEntry};
use crate::document::CameraDef;
use crate::extensions::LightsExtension;

/// Builds the camera of `camera_def`, or `None` when its type-specific
/// parameters are missing.
fn build_camera(camera_def: &CameraDef) -> Option<Camera> {
    match camera_def.camera_type.as_str() {
        "perspective" => {
            let params = camera_def.perspective.as_ref()?;
            let yfov = params.yfov?;
            let nonzero = |value: Option<f32>, default: f32| value.filter(|v| *v != 0.0).unwrap_or(default);
            Some(Camera::Perspective {
                fov: yfov.to_degrees(),
                aspect: nonzero(params.aspect_ratio, 1.0),
                near: nonzero(params.znear, 1.0),
                far: nonzero(params.zfar, 2e6),
            })
        }
        "orthographic" => {
            let params = camera_def.orthographic.as_ref()?;
            let (xmag, ymag) = (params.xmag?, params.ymag?);
            Some(Camera::Orthographic {
                left: -xmag / 2.0,
                right: xmag / 2.0,
                top: ymag / 2.0,
                bottom: -ymag / 2.0,
                near: params.znear.unwrap_or(0.1),
                far: params.zfar.unwrap_or(2000.0),
            })
        }
        _ => None,
    }
}

/// Sets the morph influences of every mesh in `object`'s subtree from
/// `weights`.
fn apply_node_weights(object: &mut Object3D, weights: &[f32]) {
    if let Some(mesh) = object.mesh_mut() {
        for (influence, weight) in mesh.morph_target_influences.iter_mut().zip(weights) {
            *influence = *weight;
        }
    }
    for child in &mut object.children {
        apply_node_weights(child, weights);
    }
}

impl GltfParser {
    pub(super) fn load_camera(&self, index: usize) -> Result<Option<Rc<Object3D>>> {
        let camera_def = resolve(&self.document.cameras, index, "camera")?;
        let Some(camera) = build_camera(camera_def) else {
            log::warn!(
                "Missing camera parameters for {} camera {}, skipping",
                camera_def.camera_type,
                index
            );
            return Ok(None);
        };

        let mut object = Object3D::new(ObjectKind::Camera(camera));
        if let Some(name) = &camera_def.name {
            object.name = name.clone();
        }
        assign_extras(&mut object.user_data, camera_def.extras.as_ref());
        Ok(Some(Rc::new(object)))
    }

    pub(super) async fn load_skin(self: Rc<Self>, index: usize) -> Result<Rc<SkinEntry>> {
        let skin_def = resolve(&self.document.skins, index, "skin")?;
        let inverse_bind_matrices = match skin_def.inverse_bind_matrices {
            Some(accessor) => self.accessor(accessor).await?,
            None => None,
        };
        Ok(Rc::new(SkinEntry {
            joints: skin_def.joints.clone(),
            inverse_bind_matrices,
        }))
    }

    /// The object of node `index` without its children. Scene assembly
    /// attaches children and skeletons.
    pub(super) async fn load_node(self: Rc<Self>, index: usize) -> Result<Rc<Object3D>> {
        let node_def = resolve(&self.document.nodes, index, "node")?;

        let mut object = if self.marks.is_bone(index) {
            Object3D::new(ObjectKind::Bone)
        } else if let Some(mesh) = node_def.mesh {
            let mesh_object = self.get_dependency(DependencyType::Mesh, mesh).await?.object()?;
            match self.marks.mesh_use(index) {
                Some(uses) if uses > 0 => mesh_object.clone_instance(&format!("_instance_{}", uses)),
                _ => (*mesh_object).clone(),
            }
        } else if let Some(camera) = node_def.camera {
            match self.get_dependency(DependencyType::Camera, camera).await?.camera()? {
                Some(camera) => (*camera).clone(),
                None => Object3D::new(ObjectKind::Object),
            }
        } else {
            let light = LightsExtension::node_light(node_def)
                .and_then(|light| Some((self.extensions.lights()?, light)));
            match light {
                Some((lights, light)) => lights.load_light(light)?,
                None => Object3D::new(ObjectKind::Object),
            }
        };

        if let Some(name) = &node_def.name {
            object.name = sanitize_node_name(name);
        }
        assign_extras(&mut object.user_data, node_def.extras.as_ref());
        add_unknown_extensions(&self.extensions, &mut object.user_data, &node_def.extensions);

        if let Some(weights) = &node_def.weights {
            apply_node_weights(&mut object, weights);
        }

        match node_def.matrix {
            Some(matrix) => object.apply_matrix(Mat4::from_cols_array(&matrix)),
            None => {
                if let Some(translation) = node_def.translation {
                    object.position = Vec3::from_array(translation);
                }
                if let Some(rotation) = node_def.rotation {
                    object.quaternion = Quat::from_array(rotation);
                }
                if let Some(scale) = node_def.scale {
                    object.scale = Vec3::from_array(scale);
                }
            }
        }
        object.matrix_auto_update = self.marks.is_animated(index);

        Ok(Rc::new(object))
    }
}
