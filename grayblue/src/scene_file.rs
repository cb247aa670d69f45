use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use ember2d::{Camera, Square, TextFileKind, TextFileStore, Vec2, Viewport};

/// A scene descriptor parsed into engine objects: one camera and an ordered
/// list of squares. Both the JSON and XML dialects describe the same shape
/// of data; only the encoding differs.
#[derive(Debug)]
pub struct SceneFile {
    pub camera: Camera,
    pub squares: Vec<Square>,
}

impl SceneFile {
    /// Parse the cached text for `path`, using the format recorded when the
    /// file was loaded.
    pub fn from_store(store: &TextFileStore, path: &str) -> Result<Self> {
        let kind = store
            .kind(path)
            .ok_or_else(|| anyhow!("scene file {path} is not loaded"))?;
        let text = store.get(path)?;
        Self::parse(text, kind).with_context(|| format!("failed to parse scene file {path}"))
    }

    pub fn parse(text: &str, kind: TextFileKind) -> Result<Self> {
        match kind {
            TextFileKind::Json => Self::parse_json(text),
            TextFileKind::Xml => Self::parse_xml(text),
        }
    }

    fn parse_json(text: &str) -> Result<Self> {
        let doc: JsonScene = serde_json::from_str(text)?;
        let camera = build_camera(
            doc.camera.center,
            doc.camera.width,
            doc.camera.viewport,
            doc.camera.bg_color,
        );
        let squares = doc
            .squares
            .into_iter()
            .map(|sq| build_square(sq.pos, sq.width, sq.height, sq.rotation, sq.color))
            .collect();
        Ok(Self { camera, squares })
    }

    fn parse_xml(text: &str) -> Result<Self> {
        let doc = roxmltree::Document::parse(text)?;
        let root = doc.root_element();

        let camera_node = root
            .children()
            .find(|n| n.has_tag_name("Camera"))
            .ok_or_else(|| anyhow!("scene file has no Camera element"))?;
        let center = [
            attr_f32(&camera_node, "CenterX")?,
            attr_f32(&camera_node, "CenterY")?,
        ];
        let width = attr_f32(&camera_node, "Width")?;
        let viewport = attr_f32_list::<4>(&camera_node, "Viewport")?;
        let bg_color = attr_f32_list::<4>(&camera_node, "BgColor")?;
        let camera = build_camera(center, width, viewport, bg_color);

        let squares = root
            .children()
            .filter(|n| n.has_tag_name("Square"))
            .map(|node| {
                let pos = [attr_f32(&node, "PosX")?, attr_f32(&node, "PosY")?];
                let width = attr_f32(&node, "Width")?;
                let height = attr_f32(&node, "Height")?;
                let rotation = attr_f32(&node, "Rotation")?;
                let color = attr_f32_list::<4>(&node, "Color")?;
                Ok(build_square(pos, width, height, rotation, color))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { camera, squares })
    }
}

fn build_camera(center: [f32; 2], width: f32, viewport: [f32; 4], bg_color: [f32; 4]) -> Camera {
    let mut camera = Camera::new(center.into(), width, Viewport::from(viewport));
    camera.set_background_color(bg_color);
    camera
}

fn build_square(pos: [f32; 2], width: f32, height: f32, rotation_deg: f32, color: [f32; 4]) -> Square {
    let mut square = Square::new(color);
    let xform = square.xform_mut();
    xform.set_position(pos[0], pos[1]);
    xform.scale = Vec2::new(width, height);
    xform.rotation = rotation_deg.to_radians();
    square
}

fn attr_f32(node: &roxmltree::Node, name: &str) -> Result<f32> {
    let raw = node
        .attribute(name)
        .ok_or_else(|| anyhow!("<{}> is missing attribute {name}", node.tag_name().name()))?;
    raw.trim()
        .parse()
        .with_context(|| format!("attribute {name}={raw:?} is not a number"))
}

fn attr_f32_list<const N: usize>(node: &roxmltree::Node, name: &str) -> Result<[f32; N]> {
    let raw = node
        .attribute(name)
        .ok_or_else(|| anyhow!("<{}> is missing attribute {name}", node.tag_name().name()))?;
    let values = raw
        .split_whitespace()
        .map(|v| v.parse::<f32>().with_context(|| format!("attribute {name}={raw:?} is not a number list")))
        .collect::<Result<Vec<_>>>()?;
    values
        .try_into()
        .map_err(|_| anyhow!("attribute {name}={raw:?} must hold {N} numbers"))
}

#[derive(Deserialize)]
struct JsonScene {
    #[serde(rename = "Camera")]
    camera: JsonCamera,
    #[serde(rename = "Square", default)]
    squares: Vec<JsonSquare>,
}

#[derive(Deserialize)]
struct JsonCamera {
    #[serde(rename = "Center")]
    center: [f32; 2],
    #[serde(rename = "Width")]
    width: f32,
    #[serde(rename = "Viewport")]
    viewport: [f32; 4],
    #[serde(rename = "BgColor")]
    bg_color: [f32; 4],
}

#[derive(Deserialize)]
struct JsonSquare {
    #[serde(rename = "Pos")]
    pos: [f32; 2],
    #[serde(rename = "Width")]
    width: f32,
    #[serde(rename = "Height")]
    height: f32,
    #[serde(rename = "Rotation")]
    rotation: f32,
    #[serde(rename = "Color")]
    color: [f32; 4],
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember2d::Vec2;

    const JSON_SCENE: &str = r#"{
        "Camera": {
            "Center": [20, 60],
            "Width": 20,
            "Viewport": [20, 40, 600, 300],
            "BgColor": [0.8, 0.8, 0.8, 1.0]
        },
        "Square": [
            { "Pos": [20, 60], "Width": 5, "Height": 5, "Rotation": 0, "Color": [1, 1, 1, 1] },
            { "Pos": [20, 60], "Width": 2, "Height": 2, "Rotation": 45, "Color": [1, 0, 0, 1] }
        ]
    }"#;

    const XML_SCENE: &str = r#"
        <SceneFile>
            <Camera CenterX="20" CenterY="60" Width="20"
                    Viewport="20 40 600 300" BgColor="0 0 0.8 1"/>
            <Square PosX="20" PosY="60" Width="5" Height="5" Rotation="0" Color="1 1 1 1"/>
            <Square PosX="20" PosY="60" Width="2" Height="2" Rotation="45" Color="1 0 0 1"/>
        </SceneFile>"#;

    #[test]
    fn json_scene_parses_camera_and_squares() {
        let scene = SceneFile::parse(JSON_SCENE, TextFileKind::Json).unwrap();
        assert_eq!(scene.camera.wc_center(), Vec2::new(20.0, 60.0));
        assert_eq!(scene.camera.wc_width(), 20.0);
        assert_eq!(scene.camera.viewport(), Viewport::new(20.0, 40.0, 600.0, 300.0));
        assert_eq!(scene.camera.background_color(), [0.8, 0.8, 0.8, 1.0]);
        assert_eq!(scene.squares.len(), 2);
        assert_eq!(scene.squares[0].color(), [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(scene.squares[1].xform().scale, Vec2::new(2.0, 2.0));
        assert!((scene.squares[1].xform().rotation - 45.0f32.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn xml_scene_parses_camera_and_squares() {
        let scene = SceneFile::parse(XML_SCENE, TextFileKind::Xml).unwrap();
        assert_eq!(scene.camera.wc_center(), Vec2::new(20.0, 60.0));
        assert_eq!(scene.camera.background_color(), [0.0, 0.0, 0.8, 1.0]);
        assert_eq!(scene.squares.len(), 2);
        assert_eq!(scene.squares[0].xform().position, Vec2::new(20.0, 60.0));
        assert_eq!(scene.squares[1].color(), [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn xml_scene_without_camera_is_an_error() {
        let err = SceneFile::parse("<SceneFile/>", TextFileKind::Xml).unwrap_err();
        assert!(err.to_string().contains("Camera"));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(SceneFile::parse("{\"Camera\": []}", TextFileKind::Json).is_err());
    }

    #[test]
    fn xml_attribute_with_wrong_arity_is_an_error() {
        let text = r#"<SceneFile>
            <Camera CenterX="20" CenterY="60" Width="20" Viewport="20 40 600" BgColor="0 0 0 1"/>
        </SceneFile>"#;
        assert!(SceneFile::parse(text, TextFileKind::Xml).is_err());
    }
}
