//! Floor arenas

use menagerie_core::{DocumentError, ElementId, ModelDocument, Tag};

use crate::arena::Arena;
use crate::constants::{GROUNDPLANE, GROUNDPLANE_QUAD_SIZE};

/// Options for [`CheckeredFloor::new`]
#[derive(Debug, Clone)]
pub struct FloorOptions {
    pub name: String,
    /// Half extents of the plane (0 means infinite)
    pub size: [f64; 2],
    pub reflectance: f64,
    pub rgb1: [f64; 3],
    pub rgb2: [f64; 3],
    pub markrgb: [f64; 3],
}

impl Default for FloorOptions {
    fn default() -> Self {
        Self {
            name: "floor".to_string(),
            size: [0.0, 0.0],
            reflectance: 0.2,
            rgb1: [0.2, 0.3, 0.4],
            rgb2: [0.1, 0.2, 0.3],
            markrgb: [0.8, 0.8, 0.8],
        }
    }
}

/// An arena with a checkered ground plane under a gradient sky
#[derive(Debug, Clone)]
pub struct CheckeredFloor {
    arena: Arena,
    size: [f64; 2],
    ground_geom: ElementId,
}

impl CheckeredFloor {
    pub fn new(options: FloorOptions) -> Result<Self, DocumentError> {
        let mut arena = Arena::new(options.name)?;
        let doc = arena.document_mut();
        let asset = doc.asset();

        let skybox = doc.add(asset, Tag::Texture)?;
        doc.set_attr(skybox, "type", "skybox")?;
        doc.set_attr(skybox, "builtin", "gradient")?;
        doc.set_attr(skybox, "rgb1", [0.3, 0.5, 0.7])?;
        doc.set_attr(skybox, "rgb2", [0.0, 0.0, 0.0])?;
        doc.set_attr(skybox, "width", 512)?;
        doc.set_attr(skybox, "height", 3072)?;

        let texture = doc.add_named(asset, Tag::Texture, GROUNDPLANE)?;
        doc.set_attr(texture, "type", "2d")?;
        doc.set_attr(texture, "builtin", "checker")?;
        doc.set_attr(texture, "mark", "edge")?;
        doc.set_attr(texture, "rgb1", options.rgb1)?;
        doc.set_attr(texture, "rgb2", options.rgb2)?;
        doc.set_attr(texture, "markrgb", options.markrgb)?;
        doc.set_attr(texture, "width", 300)?;
        doc.set_attr(texture, "height", 300)?;

        let material = doc.add_named(asset, Tag::Material, GROUNDPLANE)?;
        doc.set_attr(material, "texture", GROUNDPLANE)?;
        doc.set_attr(material, "texuniform", true)?;
        doc.set_attr(material, "texrepeat", [5.0, 5.0])?;
        doc.set_attr(material, "reflectance", options.reflectance)?;

        let worldbody = doc.worldbody();
        let ground_geom = doc.add_named(worldbody, Tag::Geom, GROUNDPLANE)?;
        doc.set_attr(ground_geom, "type", "plane")?;
        doc.set_attr(ground_geom, "material", GROUNDPLANE)?;
        let [width, height] = options.size;
        doc.set_attr(ground_geom, "size", [width, height, GROUNDPLANE_QUAD_SIZE])?;
        doc.set_attr(ground_geom, "condim", 3)?;

        tracing::debug!("Built checkered floor '{}'", arena.name());
        Ok(Self {
            arena,
            size: options.size,
            ground_geom,
        })
    }

    pub fn ground_geoms(&self) -> &[ElementId] {
        std::slice::from_ref(&self.ground_geom)
    }

    pub fn size(&self) -> [f64; 2] {
        self.size
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn document(&self) -> &ModelDocument {
        self.arena.document()
    }

    pub fn into_document(self) -> ModelDocument {
        self.arena.into_document()
    }
}
