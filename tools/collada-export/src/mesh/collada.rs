//! COLLADA geometry extraction

use hashbrown::HashMap;
use xmltree::Element;

use super::types::{Face, MeshGroup};
use crate::document::{fragment, parse_numbers, read_float_source, ElementExt, SceneDocument};
use crate::error::{ConvertError, Result};

/// Primitive blocks we read; anything else (lines, tristrips...) is skipped
const PRIMITIVE_BLOCKS: [&str; 2] = ["triangles", "polylist"];

/// One declared `<input>` of a primitive block
#[derive(Debug, Clone, Copy)]
struct Channel<'a> {
    source: &'a str,
    offset: usize,
}

/// Extract every triangle/polylist block of every geometry, in document order
pub fn extract_geometry(document: &SceneDocument) -> Result<Vec<MeshGroup>> {
    let library = document.require_library("library_geometries")?;
    let bindings = material_bindings(document);

    let mut groups = Vec::new();
    for geometry in library.children_named("geometry") {
        let name = geometry.attr("id").unwrap_or_default();
        let Some(mesh) = geometry.child("mesh") else {
            tracing::debug!("Geometry '{}' has no <mesh>, skipped", name);
            continue;
        };

        for block in mesh
            .elements()
            .filter(|e| PRIMITIVE_BLOCKS.contains(&e.name.as_str()))
        {
            let mut group = extract_group(mesh, block)?;
            group.name = name.to_string();
            group.material_id = block.attr("material").map(|symbol| {
                bindings
                    .get(&(name.to_string(), symbol.to_string()))
                    .cloned()
                    .unwrap_or_else(|| symbol.to_string())
            });
            tracing::debug!(
                "Geometry '{}' <{}>: {} positions, {} normals, {} uvs, {} triangles",
                name,
                block.name,
                group.positions.len(),
                group.normals.len(),
                group.uvs.len(),
                group.triangle_count()
            );
            groups.push(group);
        }
    }

    Ok(groups)
}

/// (geometry id, symbol) -> material id
///
/// A symbol is scoped to the `bind_material` of the instance declaring it. An
/// `instance_controller` binds the geometry its skin is built on.
fn material_bindings(document: &SceneDocument) -> HashMap<(String, String), String> {
    let mut bindings = HashMap::new();
    let Some(scenes) = document.library("library_visual_scenes") else {
        return bindings;
    };
    let controllers = document.library("library_controllers");

    for tag in ["instance_geometry", "instance_controller"] {
        for instance in scenes.descendants_named(tag) {
            let Some(url) = instance.attr("url") else {
                continue;
            };
            let geometry_id = if tag == "instance_controller" {
                let skin_source = controllers
                    .and_then(|library| library.find_with_attr("controller", "id", fragment(url)))
                    .and_then(|controller| controller.child("skin"))
                    .and_then(|skin| skin.attr("source"));
                match skin_source {
                    Some(source) => fragment(source),
                    None => {
                        tracing::debug!("Controller '{}' has no skin source, bindings ignored", url);
                        continue;
                    }
                }
            } else {
                fragment(url)
            };

            for binding in instance.descendants_named("instance_material") {
                let (Some(symbol), Some(target)) = (binding.attr("symbol"), binding.attr("target"))
                else {
                    continue;
                };
                bindings
                    .entry((geometry_id.to_string(), symbol.to_string()))
                    .or_insert_with(|| fragment(target).to_string());
            }
        }
    }

    bindings
}

fn extract_group(mesh: &Element, block: &Element) -> Result<MeshGroup> {
    let context = block.describe();

    // Offsets come from each input's declaration, never from its position
    let mut inputs: HashMap<&str, Channel<'_>> = HashMap::new();
    let mut stride = 0;
    for input in block.children_named("input") {
        let semantic = input.require_attr("semantic")?;
        let channel = Channel {
            source: fragment(input.require_attr("source")?),
            offset: parse_offset(input, &context)?,
        };
        stride = stride.max(channel.offset + 1);
        // First declaration wins (TEXCOORD set 0)
        inputs.entry(semantic).or_insert(channel);
    }

    let vertex = inputs
        .get("VERTEX")
        .copied()
        .ok_or_else(|| ConvertError::missing("input[@semantic=VERTEX]", context.as_str()))?;
    let vertices = mesh
        .find_with_attr("vertices", "id", vertex.source)
        .ok_or_else(|| ConvertError::unresolved("vertices", vertex.source))?;
    let position_source = vertices
        .input("POSITION")
        .ok_or_else(|| ConvertError::missing("input[@semantic=POSITION]", vertices.describe()))?
        .require_attr("source")?;
    let positions = read_float_source(mesh, fragment(position_source), 3)?.tuples::<3>()?;

    let normal = shared_channel(&inputs, vertices, vertex, "NORMAL")?;
    let uv = shared_channel(&inputs, vertices, vertex, "TEXCOORD")?;

    let normals = match normal {
        Some(channel) => read_float_source(mesh, channel.source, 3)?.tuples::<3>()?,
        None => Vec::new(),
    };
    let uvs = match uv {
        Some(channel) => read_float_source(mesh, channel.source, 2)?.tuples::<2>()?,
        None => Vec::new(),
    };

    let indices: Vec<usize> = match block.child("p") {
        Some(p) => parse_numbers(&p.text(), &context)?,
        None => Vec::new(),
    };
    if indices.len() % stride != 0 {
        return Err(ConvertError::count(
            context,
            format!("{} indices is not a multiple of {} inputs", indices.len(), stride),
        ));
    }

    let mut faces = Vec::with_capacity(indices.len() / stride);
    for tuple in indices.chunks_exact(stride) {
        faces.push(Face {
            position: checked_index(tuple[vertex.offset], positions.len(), &context)?,
            normal: normal
                .map(|c| checked_index(tuple[c.offset], normals.len(), &context))
                .transpose()?,
            uv: uv
                .map(|c| checked_index(tuple[c.offset], uvs.len(), &context))
                .transpose()?,
        });
    }

    validate_primitive_count(block, faces.len(), &context)?;

    Ok(MeshGroup {
        name: String::new(),
        positions,
        normals,
        uvs,
        faces,
        material_id: None,
    })
}

/// NORMAL/TEXCOORD may sit on the block or share the VERTEX offset via `<vertices>`
fn shared_channel<'a>(
    inputs: &HashMap<&'a str, Channel<'a>>,
    vertices: &'a Element,
    vertex: Channel<'a>,
    semantic: &str,
) -> Result<Option<Channel<'a>>> {
    if let Some(channel) = inputs.get(semantic) {
        return Ok(Some(*channel));
    }
    match vertices.input(semantic) {
        Some(input) => Ok(Some(Channel {
            source: fragment(input.require_attr("source")?),
            offset: vertex.offset,
        })),
        None => Ok(None),
    }
}

fn parse_offset(input: &Element, context: &str) -> Result<usize> {
    match input.attr("offset") {
        Some(offset) => offset.trim().parse().map_err(|_| ConvertError::InvalidNumber {
            context: context.to_string(),
            token: offset.to_string(),
        }),
        None => Ok(0),
    }
}

fn checked_index(index: usize, len: usize, context: &str) -> Result<u32> {
    if index >= len {
        return Err(ConvertError::IndexOutOfRange {
            context: context.to_string(),
            index: index as i64,
            len,
        });
    }
    Ok(index as u32)
}

/// Faces must form whole triangles and agree with the block's `count`
fn validate_primitive_count(block: &Element, face_entries: usize, context: &str) -> Result<()> {
    if face_entries % 3 != 0 {
        return Err(ConvertError::count(
            context,
            format!("{} face entries do not form whole triangles", face_entries),
        ));
    }
    let triangles = face_entries / 3;

    if block.name == "polylist" {
        let vcount: Vec<usize> = match block.child("vcount") {
            Some(vcount) => parse_numbers(&vcount.text(), context)?,
            None => Vec::new(),
        };
        if let Some(sides) = vcount.iter().find(|&&n| n != 3) {
            return Err(ConvertError::count(
                context,
                format!("polygon with {} vertices (only triangles are supported)", sides),
            ));
        }
        if vcount.len() != triangles {
            return Err(ConvertError::count(
                context,
                format!("vcount lists {} polygons but <p> holds {}", vcount.len(), triangles),
            ));
        }
    }

    if let Some(count) = block.attr("count") {
        let declared: usize = count.trim().parse().map_err(|_| ConvertError::InvalidNumber {
            context: context.to_string(),
            token: count.to_string(),
        })?;
        if declared != triangles {
            return Err(ConvertError::count(
                context,
                format!("declared count {} but <p> holds {} triangles", declared, triangles),
            ));
        }
    }

    Ok(())
}
