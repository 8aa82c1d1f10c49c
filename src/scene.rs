use anyhow::{anyhow, Context, Result};
use glam::Vec3;
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::camera::{view_from_pose, Camera};
use crate::cluster::FrameInput;
use crate::config::{ClusterConfig, GridDims};
use crate::light::Light;

/// Camera and lights described by a scene file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
    pub lights: Vec<Light>,
    /// Grid settings from an optional `<clusters>` block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clusters: Option<ClusterConfig>,
}

impl Scene {
    /// Parses the scene XML object list.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid scene XML")?;
        let mut objects = Vec::new();

        for node in document.descendants().filter(|n| n.has_tag_name("object")) {
            let mut object = SceneObject::default();
            object.name = required_text(&node, "name")?;
            object.object_type = optional_text(&node, "type").unwrap_or_else(|| "mesh".to_string());
            object.color = parse_color(optional_text(&node, "color"), object.color)?;
            object.position = parse_vec3(optional_text(&node, "position"), object.position)?;
            object.rotation = parse_vec3(optional_text(&node, "rotation"), object.rotation)?;
            object.fov = parse_f32(optional_text(&node, "fov"), object.fov)?;
            object.near = parse_f32(optional_text(&node, "near"), object.near)?;
            object.far = parse_f32(optional_text(&node, "far"), object.far)?;
            object.aspect = parse_f32(optional_text(&node, "aspect"), object.aspect)?;
            object.radius = parse_f32(optional_text(&node, "radius"), object.radius)?;
            objects.push(object);
        }

        // Declaration order is the light index order.
        let lights = objects
            .iter()
            .filter(|obj| obj.object_type == "light")
            .map(|obj| Light::new(obj.position, obj.radius, obj.color))
            .collect();

        let clusters = document
            .descendants()
            .find(|n| n.has_tag_name("clusters"))
            .map(|node| parse_clusters(&node))
            .transpose()
            .context("invalid <clusters> block")?;

        Ok(Self {
            objects,
            lights,
            clusters,
        })
    }

    /// First camera object, or a default camera at the origin looking down -Z.
    pub fn camera(&self) -> &SceneObject {
        static DEFAULT_CAMERA: SceneObject = SceneObject::DEFAULT;
        self.objects
            .iter()
            .find(|o| o.object_type == "camera")
            .unwrap_or(&DEFAULT_CAMERA)
    }

    /// Camera, view matrix and lights for one cluster pass.
    pub fn frame_input(&self) -> FrameInput {
        let camera = self.camera();
        FrameInput {
            camera: Camera::new(camera.near, camera.far, camera.fov, camera.aspect),
            view: view_from_pose(camera.position, camera.rotation),
            lights: self.lights.clone(),
        }
    }
}

/// Object entry of the scene file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub name: String,
    #[serde(rename = "type")]
    pub object_type: String,
    #[serde(default = "default_color")]
    pub color: Vec3,
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default = "default_fov")]
    pub fov: f32,
    #[serde(default = "default_near")]
    pub near: f32,
    #[serde(default = "default_far")]
    pub far: f32,
    #[serde(default = "default_aspect")]
    pub aspect: f32,
    #[serde(default = "default_radius")]
    pub radius: f32,
}

impl Default for SceneObject {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl SceneObject {
    const DEFAULT: Self = Self {
        name: String::new(),
        object_type: String::new(),
        color: Vec3::ONE,
        position: Vec3::ZERO,
        rotation: Vec3::ZERO,
        fov: 60.0,
        near: 0.1,
        far: 100.0,
        aspect: 1.0,
        radius: 1.0,
    };
}

fn default_color() -> Vec3 {
    Vec3::ONE
}

fn default_fov() -> f32 {
    60.0
}

fn default_near() -> f32 {
    0.1
}

fn default_far() -> f32 {
    100.0
}

fn default_aspect() -> f32 {
    1.0
}

fn default_radius() -> f32 {
    1.0
}

/// Reads the `<clusters>` block. Values are only checked for syntax here;
/// the grid validates the final configuration once command line overrides
/// are applied.
fn parse_clusters(node: &Node<'_, '_>) -> Result<ClusterConfig> {
    let mut config = ClusterConfig::default();
    if let Some(dims) = optional_text(node, "dims") {
        config.dims = dims.parse::<GridDims>()?;
    }
    if let Some(max) = optional_text(node, "max-lights") {
        config.max_lights_per_cluster = max
            .parse::<u32>()
            .map_err(|err| anyhow!("failed to parse max-lights: {err}"))?;
    }
    Ok(config)
}

fn required_text(node: &Node<'_, '_>, tag: &str) -> Result<String> {
    optional_text(node, tag).ok_or_else(|| anyhow!("<{tag}> tag is missing"))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_components<const N: usize>(value: &str, what: &str) -> Result<[f32; N]> {
    let mut out = [0.0; N];
    let mut numbers = value.split_whitespace();
    for slot in &mut out {
        let text = numbers
            .next()
            .ok_or_else(|| anyhow!("{what} is missing components"))?;
        *slot = text
            .parse::<f32>()
            .map_err(|err| anyhow!("invalid {what} component {text:?}: {err}"))?;
    }
    Ok(out)
}

fn parse_vec3(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    Ok(Vec3::from_array(parse_components(&value, "vector")?))
}

fn parse_color(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    Ok(Vec3::from_array(parse_components(&value, "color")?) / 255.0)
}

fn parse_f32(value: Option<String>, default: f32) -> Result<f32> {
    match value {
        Some(value) => value
            .parse::<f32>()
            .map_err(|err| anyhow!("failed to parse float: {err}")),
        None => Ok(default),
    }
}
