//! COLLADA XML assembly from generator data.

use super::mesh_data::{GroupData, SkinWeights};

fn join<T: ToString>(values: impl IntoIterator<Item = T>) -> String {
    values
        .into_iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// `<source>` holding a float_array with an accessor of the given stride
pub fn float_source(id: &str, values: &[f32], stride: usize) -> String {
    format!(
        r##"<source id="{id}">
  <float_array id="{id}-array" count="{count}">{values}</float_array>
  <technique_common>
    <accessor source="#{id}-array" count="{tuples}" stride="{stride}"/>
  </technique_common>
</source>"##,
        count = values.len(),
        values = join(values),
        tuples = values.len() / stride,
    )
}

fn name_source(id: &str, names: &[&str]) -> String {
    format!(
        r##"<source id="{id}">
  <Name_array id="{id}-array" count="{count}">{names}</Name_array>
  <technique_common>
    <accessor source="#{id}-array" count="{count}" stride="1"><param name="JOINT" type="name"/></accessor>
  </technique_common>
</source>"##,
        count = names.len(),
        names = names.join(" "),
    )
}

/// `<geometry>` with one `<triangles>` block using offsets 0/1/2
pub fn geometry(group: &GroupData) -> String {
    let id = group.id;
    let material = group
        .material
        .map(|m| format!(r#" material="{m}""#))
        .unwrap_or_default();
    let p = join(group.corners.iter().flatten());
    format!(
        r##"<geometry id="{id}" name="{id}">
  <mesh>
    {positions}
    {normals}
    {uvs}
    <vertices id="{id}-vertices">
      <input semantic="POSITION" source="#{id}-positions"/>
    </vertices>
    <triangles{material} count="{count}">
      <input semantic="VERTEX" source="#{id}-vertices" offset="0"/>
      <input semantic="NORMAL" source="#{id}-normals" offset="1"/>
      <input semantic="TEXCOORD" source="#{id}-map" offset="2" set="0"/>
      <p>{p}</p>
    </triangles>
  </mesh>
</geometry>"##,
        positions = float_source(&format!("{id}-positions"), &group.positions.concat(), 3),
        normals = float_source(&format!("{id}-normals"), &group.normals.concat(), 3),
        uvs = float_source(&format!("{id}-map"), &group.uvs.concat(), 2),
        count = group.triangle_count(),
    )
}

/// Image with a 1.4-style `<init_from>` path
pub fn image(id: &str, path: &str) -> String {
    format!(r#"<image id="{id}" name="{id}"><init_from>{path}</init_from></image>"#)
}

/// `profile_COMMON` phong effect; `newparams` and `slots` are raw XML
pub fn phong_effect(id: &str, newparams: &str, slots: &str) -> String {
    format!(
        r#"<effect id="{id}">
  <profile_COMMON>
    {newparams}
    <technique sid="common">
      <phong>
        {slots}
      </phong>
    </technique>
  </profile_COMMON>
</effect>"#
    )
}

/// surface + sampler2D newparam pair pointing at `image_id`
pub fn sampler_newparams(prefix: &str, image_id: &str) -> String {
    format!(
        r#"<newparam sid="{prefix}-surface">
  <surface type="2D"><init_from>{image_id}</init_from></surface>
</newparam>
<newparam sid="{prefix}-sampler">
  <sampler2D><source>{prefix}-surface</source></sampler2D>
</newparam>"#
    )
}

pub fn color_slot(slot: &str, rgba: [f32; 4]) -> String {
    format!(r#"<{slot}><color sid="{slot}">{}</color></{slot}>"#, join(rgba))
}

pub fn float_slot(slot: &str, value: f32) -> String {
    format!(r#"<{slot}><float sid="{slot}">{value}</float></{slot}>"#)
}

pub fn texture_slot(slot: &str, sampler: &str) -> String {
    format!(r#"<{slot}><texture texture="{sampler}" texcoord="UVMap"/></{slot}>"#)
}

pub fn material(id: &str, effect: &str) -> String {
    format!(r##"<material id="{id}" name="{id}"><instance_effect url="#{effect}"/></material>"##)
}

/// Skin controller over `mesh_id` with inverse bind matrices for every joint
pub fn skin_controller(
    id: &str,
    mesh_id: &str,
    joints: &[&str],
    inverse_bind: &[[f32; 16]],
    weights: &SkinWeights,
) -> String {
    format!(
        r##"<controller id="{id}" name="Armature">
  <skin source="#{mesh_id}">
    <bind_shape_matrix>1 0 0 0 0 1 0 0 0 0 1 0 0 0 0 1</bind_shape_matrix>
    {joint_source}
    {bind_source}
    {weight_source}
    <joints>
      <input semantic="JOINT" source="#{id}-joints"/>
      <input semantic="INV_BIND_MATRIX" source="#{id}-bind_poses"/>
    </joints>
    <vertex_weights count="{vertex_count}">
      <input semantic="JOINT" source="#{id}-joints" offset="0"/>
      <input semantic="WEIGHT" source="#{id}-weights" offset="1"/>
      <vcount>{vcount}</vcount>
      <v>{v}</v>
    </vertex_weights>
  </skin>
</controller>"##,
        joint_source = name_source(&format!("{id}-joints"), joints),
        bind_source = float_source(&format!("{id}-bind_poses"), &inverse_bind.concat(), 16),
        weight_source = float_source(&format!("{id}-weights"), &weights.weights, 1),
        vertex_count = weights.vcount.len(),
        vcount = join(&weights.vcount),
        v = join(&weights.v),
    )
}

/// One `<animation>` driving `target` with full-matrix samples
pub fn matrix_animation(joint: &str, times: &[f32], samples: &[[f32; 16]]) -> String {
    format!(
        r##"<animation id="{joint}-anim">
  {input}
  {output}
  <sampler id="{joint}-sampler">
    <input semantic="INPUT" source="#{joint}-input"/>
    <input semantic="OUTPUT" source="#{joint}-output"/>
  </sampler>
  <channel source="#{joint}-sampler" target="{joint}/transform"/>
</animation>"##,
        input = float_source(&format!("{joint}-input"), times, 1),
        output = float_source(&format!("{joint}-output"), &samples.concat(), 16),
    )
}

/// Joint node with a `<matrix>` and nested children
pub fn joint_node(id: &str, matrix: &[f32; 16], children: &str) -> String {
    format!(
        r#"<node id="{id}" name="{id}" sid="{id}" type="JOINT">
  <matrix sid="transform">{}</matrix>
  {children}
</node>"#,
        join(matrix)
    )
}

/// Node instancing a geometry, binding each symbol to the same-named material
pub fn geometry_node(geometry_id: &str, materials: &[&str]) -> String {
    format!(
        r##"<node id="{geometry_id}-node">
  <instance_geometry url="#{geometry_id}">{}</instance_geometry>
</node>"##,
        bind_materials(materials)
    )
}

/// Node instancing a skin controller rooted at `skeleton_root`
pub fn controller_node(controller_id: &str, skeleton_root: &str, materials: &[&str]) -> String {
    format!(
        r##"<node id="{controller_id}-node">
  <instance_controller url="#{controller_id}">
    <skeleton>#{skeleton_root}</skeleton>
    {}
  </instance_controller>
</node>"##,
        bind_materials(materials)
    )
}

fn bind_materials(materials: &[&str]) -> String {
    if materials.is_empty() {
        return String::new();
    }
    let instances: String = materials
        .iter()
        .map(|m| format!(r##"<instance_material symbol="{m}" target="#{m}"/>"##))
        .collect();
    format!(
        "<bind_material><technique_common>{}</technique_common></bind_material>",
        instances
    )
}

/// `library_*` element, omitted entirely when `items` is empty
pub fn library(tag: &str, items: &[String]) -> String {
    if items.is_empty() {
        return String::new();
    }
    format!("<{tag}>\n{}\n</{tag}>", items.concat())
}

/// Namespaced COLLADA 1.4.1 document wrapping the given libraries
pub fn document(libraries: &[String]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<COLLADA xmlns="http://www.collada.org/2005/11/COLLADASchema" version="1.4.1">
  <asset><unit name="meter" meter="1"/><up_axis>Z_UP</up_axis></asset>
  {}
</COLLADA>"#,
        libraries.concat()
    )
}
