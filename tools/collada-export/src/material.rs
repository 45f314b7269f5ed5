//! Material resolver
//!
//! Flattens `library_effects` into per-material parameter lists. Texture slots
//! go through the effect's newparam chain (sampler -> surface -> image) and end
//! at a file path from `library_images`.

use hashbrown::HashMap;
use xmltree::Element;

use crate::document::{fragment, parse_numbers, ElementExt, SceneDocument};
use crate::error::{ConvertError, Result};

/// Shading blocks whose parameter slots we read, in lookup order
const SHADING_MODELS: [&str; 3] = ["phong", "blinn", "lambert"];

/// Discriminant of a [`ParamValue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Texture,
    Rgba,
    Float,
}

/// Value of a shading parameter, decided once at parse time
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Resolved image file path
    Texture(String),
    Rgba([f32; 4]),
    Float(f32),
}

/// One slot of a shading block, e.g. `diffuse`
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialParam {
    pub id: String,
    pub value: ParamValue,
}

impl MaterialParam {
    pub fn kind(&self) -> ParamKind {
        match self.value {
            ParamValue::Texture(_) => ParamKind::Texture,
            ParamValue::Rgba(_) => ParamKind::Rgba,
            ParamValue::Float(_) => ParamKind::Float,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub id: String,
    pub name: String,
    pub params: Vec<MaterialParam>,
}

/// Resolve every `<material>` in the document to its effect parameters
///
/// Returns an empty list when the document has no `library_materials`.
pub fn extract_materials(document: &SceneDocument) -> Result<Vec<Material>> {
    let Some(library) = document.library("library_materials") else {
        return Ok(Vec::new());
    };

    // Images first: effects resolve texture slots against this table
    let images = extract_images(document)?;

    let mut effects: HashMap<String, Vec<MaterialParam>> = HashMap::new();
    if let Some(library_effects) = document.library("library_effects") {
        for effect in library_effects.children_named("effect") {
            let effect_id = effect.require_attr("id")?;
            let params = extract_effect(effect, &images)?;
            tracing::debug!("Effect '{}': {} params", effect_id, params.len());
            effects.insert(effect_id.to_string(), params);
        }
    }

    let mut materials = Vec::new();
    for node in library.children_named("material") {
        let id = node.require_attr("id")?;
        let url = node.require_child("instance_effect")?.require_attr("url")?;
        let effect_id = fragment(url);
        let params = effects
            .get(effect_id)
            .cloned()
            .ok_or_else(|| ConvertError::unresolved("effect", effect_id))?;

        materials.push(Material {
            id: id.to_string(),
            name: node.attr("name").unwrap_or(id).to_string(),
            params,
        });
    }

    Ok(materials)
}

/// Build the image id -> file path table
fn extract_images(document: &SceneDocument) -> Result<HashMap<String, String>> {
    let mut images = HashMap::new();
    let Some(library) = document.library("library_images") else {
        return Ok(images);
    };

    for image in library.children_named("image") {
        let id = image.require_attr("id")?;
        let init_from = image.require_child("init_from")?;
        // COLLADA 1.5 nests the path in <ref>
        let path = match init_from.child("ref") {
            Some(reference) => reference.text(),
            None => init_from.text(),
        };
        images.insert(id.to_string(), path.trim().to_string());
    }

    Ok(images)
}

fn extract_effect(effect: &Element, images: &HashMap<String, String>) -> Result<Vec<MaterialParam>> {
    let effect_id = effect.attr("id").unwrap_or_default();
    let profile = effect
        .child("profile_COMMON")
        .ok_or_else(|| ConvertError::UnsupportedProfile {
            effect: effect_id.to_string(),
        })?;

    let newparams = extract_newparams(profile)?;

    let shading = SHADING_MODELS
        .iter()
        .find_map(|model| profile.find_descendant(model))
        .ok_or_else(|| ConvertError::missing("phong", effect.describe()))?;

    shading
        .elements()
        .map(|slot| extract_param(effect_id, slot, &newparams, images))
        .collect()
}

/// Map each newparam sid to the image id it ultimately names
fn extract_newparams(profile: &Element) -> Result<HashMap<String, String>> {
    let mut newparams = HashMap::new();

    for newparam in profile.children_named("newparam") {
        let sid = newparam.require_attr("sid")?;

        let image_id = if let Some(surface) = newparam.child("surface") {
            surface.require_child("init_from")?.text().trim().to_string()
        } else if let Some(sampler) = newparam.child("sampler2D") {
            if let Some(source) = sampler.child("source") {
                // One level of indirection: the sampler names a surface newparam
                let target_sid = source.text().trim().to_string();
                let target = profile
                    .children_named("newparam")
                    .find(|n| n.attr("sid") == Some(target_sid.as_str()))
                    .ok_or_else(|| ConvertError::unresolved("newparam", target_sid.as_str()))?;
                target
                    .find_descendant("init_from")
                    .ok_or_else(|| ConvertError::missing("init_from", target.describe()))?
                    .text()
                    .trim()
                    .to_string()
            } else if let Some(instance) = sampler.child("instance_image") {
                fragment(instance.require_attr("url")?).to_string()
            } else {
                tracing::debug!("newparam '{}': sampler without image, ignored", sid);
                continue;
            }
        } else {
            continue;
        };

        newparams.insert(sid.to_string(), image_id);
    }

    Ok(newparams)
}

fn extract_param(
    effect_id: &str,
    slot: &Element,
    newparams: &HashMap<String, String>,
    images: &HashMap<String, String>,
) -> Result<MaterialParam> {
    let texture = slot.child("texture");
    let color = slot.child("color");
    let float = slot.child("float");

    let value = match (texture, color, float) {
        (Some(texture), None, None) => {
            let reference = texture.require_attr("texture")?;
            ParamValue::Texture(resolve_texture(reference, newparams, images)?)
        }
        (None, Some(color), None) => {
            let context = format!("{} color in effect '{}'", slot.name, effect_id);
            let rgba: Vec<f32> = parse_numbers(&color.text(), &context)?;
            let rgba: [f32; 4] = rgba.as_slice().try_into().map_err(|_| {
                ConvertError::count(context, format!("expected 4 components, found {}", rgba.len()))
            })?;
            ParamValue::Rgba(rgba)
        }
        (None, None, Some(float)) => {
            let context = format!("{} float in effect '{}'", slot.name, effect_id);
            let text = float.text();
            let token = text.trim();
            let value = token.parse::<f32>().map_err(|_| ConvertError::InvalidNumber {
                context,
                token: token.to_string(),
            })?;
            ParamValue::Float(value)
        }
        _ => {
            let found = [texture.is_some(), color.is_some(), float.is_some()]
                .into_iter()
                .filter(|present| *present)
                .count();
            return Err(ConvertError::AmbiguousParameter {
                effect: effect_id.to_string(),
                param: slot.name.clone(),
                found,
            });
        }
    };

    Ok(MaterialParam {
        id: slot.name.clone(),
        value,
    })
}

/// newparam sid -> image id -> path; a bare image id is accepted as well
fn resolve_texture(
    reference: &str,
    newparams: &HashMap<String, String>,
    images: &HashMap<String, String>,
) -> Result<String> {
    let image_id = newparams.get(reference).map(String::as_str).unwrap_or(reference);
    images.get(image_id).cloned().ok_or_else(|| {
        if newparams.contains_key(reference) {
            ConvertError::unresolved("image", image_id)
        } else {
            ConvertError::unresolved("newparam", reference)
        }
    })
}
