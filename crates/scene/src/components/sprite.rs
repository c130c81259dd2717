/// RGBA8 bitmap, row-major, no padding between rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteTexture {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl SpriteTexture {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Self {
        debug_assert_eq!(rgba.len(), width as usize * height as usize * 4);
        Self {
            width,
            height,
            rgba,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// Camera-facing textured quad. `scale` is the on-screen extent in scene
/// units and does not depend on the texture's pixel size.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Sprite {
    pub texture: TextureId,
    pub scale: [f64; 3],
}

impl Sprite {
    pub fn new(texture: TextureId, scale: [f64; 3]) -> Self {
        Self { texture, scale }
    }
}
