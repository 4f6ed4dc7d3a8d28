//! GL enum tables used by glTF samplers, primitives and materials.

/// Texture filter modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter {
    Nearest,
    Linear,
    NearestMipMapNearest,
    LinearMipMapNearest,
    NearestMipMapLinear,
    LinearMipMapLinear,
}

impl Filter {
    pub fn from_gl(code: u32) -> Option<Self> {
        match code {
            9728 => Some(Filter::Nearest),
            9729 => Some(Filter::Linear),
            9984 => Some(Filter::NearestMipMapNearest),
            9985 => Some(Filter::LinearMipMapNearest),
            9986 => Some(Filter::NearestMipMapLinear),
            9987 => Some(Filter::LinearMipMapLinear),
            _ => None,
        }
    }
}

/// Texture wrapping modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wrapping {
    ClampToEdge,
    MirroredRepeat,
    Repeat,
}

impl Wrapping {
    pub fn from_gl(code: u32) -> Option<Self> {
        match code {
            33071 => Some(Wrapping::ClampToEdge),
            33648 => Some(Wrapping::MirroredRepeat),
            10497 => Some(Wrapping::Repeat),
            _ => None,
        }
    }
}

/// Depth comparison functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthFunc {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

impl DepthFunc {
    pub fn from_gl(code: u32) -> Option<Self> {
        match code {
            512 => Some(DepthFunc::Never),
            513 => Some(DepthFunc::Less),
            514 => Some(DepthFunc::Equal),
            515 => Some(DepthFunc::LessEqual),
            516 => Some(DepthFunc::Greater),
            517 => Some(DepthFunc::NotEqual),
            518 => Some(DepthFunc::GreaterEqual),
            519 => Some(DepthFunc::Always),
            _ => None,
        }
    }
}

/// Primitive draw modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawMode {
    Points = 0,
    Lines = 1,
    LineLoop = 2,
    LineStrip = 3,
    Triangles = 4,
    TriangleStrip = 5,
    TriangleFan = 6,
}

impl DrawMode {
    pub fn from_gl(code: u32) -> Option<Self> {
        match code {
            0 => Some(DrawMode::Points),
            1 => Some(DrawMode::Lines),
            2 => Some(DrawMode::LineLoop),
            3 => Some(DrawMode::LineStrip),
            4 => Some(DrawMode::Triangles),
            5 => Some(DrawMode::TriangleStrip),
            6 => Some(DrawMode::TriangleFan),
            _ => None,
        }
    }
}

/// Maps a glTF attribute semantic to the runtime attribute name, including
/// the deprecated spellings.
pub fn runtime_attribute_name(semantic: &str) -> Option<&'static str> {
    match semantic {
        "POSITION" => Some("position"),
        "NORMAL" => Some("normal"),
        "TEXCOORD_0" | "TEXCOORD0" | "TEXCOORD" => Some("uv"),
        "TEXCOORD_1" => Some("uv2"),
        "COLOR_0" | "COLOR0" | "COLOR" => Some("color"),
        "WEIGHTS_0" | "WEIGHT" => Some("skinWeight"),
        "JOINTS_0" | "JOINT" => Some("skinIndex"),
        _ => None,
    }
}
