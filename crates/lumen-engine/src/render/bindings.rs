//! Declarative binding tables.
//!
//! Each program lists its resources as `(name, slot, kind)` in bind group 0.
//! The table produces the wgpu layout and is checked against the globals the
//! WGSL source actually declares.

use thiserror::Error;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BindingKind {
    Uniform,
    /// Filterable float 2D texture.
    Texture,
    /// Filtering sampler.
    Sampler,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Binding {
    pub name: &'static str,
    pub slot: u32,
    pub kind: BindingKind,
    pub visibility: wgpu::ShaderStages,
}

impl Binding {
    pub const fn new(
        name: &'static str,
        slot: u32,
        kind: BindingKind,
        visibility: wgpu::ShaderStages,
    ) -> Self {
        Self {
            name,
            slot,
            kind,
            visibility,
        }
    }

    pub const fn fragment(name: &'static str, slot: u32, kind: BindingKind) -> Self {
        Self::new(name, slot, kind, wgpu::ShaderStages::FRAGMENT)
    }

    pub fn layout_entry(&self) -> wgpu::BindGroupLayoutEntry {
        let ty = match self.kind {
            BindingKind::Uniform => wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            BindingKind::Texture => wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            BindingKind::Sampler => {
                wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering)
            }
        };
        wgpu::BindGroupLayoutEntry {
            binding: self.slot,
            visibility: self.visibility,
            ty,
            count: None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BindingError {
    #[error("slot {slot} is used by both `{first}` and `{second}`")]
    DuplicateSlot {
        slot: u32,
        first: &'static str,
        second: &'static str,
    },

    #[error("`{name}` is not declared in the shader")]
    Missing { name: &'static str },

    #[error("`{name}` is declared at @group({group}) @binding({found}), expected @group(0) @binding({expected})")]
    WrongSlot {
        name: &'static str,
        group: u32,
        found: u32,
        expected: u32,
    },

    #[error("`{name}` is declared as {found:?}, expected {expected:?}")]
    WrongKind {
        name: &'static str,
        found: Option<BindingKind>,
        expected: BindingKind,
    },

    #[error("shader declares `{name}` at @group({group}) @binding({slot}) which is not in the table")]
    Undeclared { name: String, group: u32, slot: u32 },
}

/// Checks a table for slot collisions.
pub fn validate_table(table: &[Binding]) -> Result<(), BindingError> {
    for (i, a) in table.iter().enumerate() {
        if let Some(b) = table[i + 1..].iter().find(|b| b.slot == a.slot) {
            return Err(BindingError::DuplicateSlot {
                slot: a.slot,
                first: a.name,
                second: b.name,
            });
        }
    }
    Ok(())
}

pub fn layout_entries(table: &[Binding]) -> Vec<wgpu::BindGroupLayoutEntry> {
    table.iter().map(Binding::layout_entry).collect()
}

/// A resource global found in a parsed module.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DeclaredResource {
    name: String,
    group: u32,
    slot: u32,
    kind: Option<BindingKind>,
}

fn declared_resources(module: &naga::Module) -> Vec<DeclaredResource> {
    module
        .global_variables
        .iter()
        .filter_map(|(_, var)| {
            let binding = var.binding.as_ref()?;
            let kind = match (&var.space, &module.types[var.ty].inner) {
                (naga::AddressSpace::Uniform, _) => Some(BindingKind::Uniform),
                (naga::AddressSpace::Handle, naga::TypeInner::Image { .. }) => {
                    Some(BindingKind::Texture)
                }
                (naga::AddressSpace::Handle, naga::TypeInner::Sampler { comparison: false }) => {
                    Some(BindingKind::Sampler)
                }
                _ => None,
            };
            Some(DeclaredResource {
                name: var.name.clone().unwrap_or_default(),
                group: binding.group,
                slot: binding.binding,
                kind,
            })
        })
        .collect()
}

/// Checks that the union of `modules` declares exactly the resources in
/// `table`, by name, slot and kind. A module may use a subset of the table.
pub fn check_against_modules(
    table: &[Binding],
    modules: &[&naga::Module],
) -> Result<(), BindingError> {
    let declared: Vec<DeclaredResource> =
        modules.iter().flat_map(|m| declared_resources(m)).collect();

    for d in &declared {
        if !table.iter().any(|b| b.name == d.name) {
            return Err(BindingError::Undeclared {
                name: d.name.clone(),
                group: d.group,
                slot: d.slot,
            });
        }
    }

    for b in table {
        let mut found = declared.iter().filter(|d| d.name == b.name).peekable();
        if found.peek().is_none() {
            return Err(BindingError::Missing { name: b.name });
        }
        for d in found {
            if d.group != 0 || d.slot != b.slot {
                return Err(BindingError::WrongSlot {
                    name: b.name,
                    group: d.group,
                    found: d.slot,
                    expected: b.slot,
                });
            }
            if d.kind != Some(b.kind) {
                return Err(BindingError::WrongKind {
                    name: b.name,
                    found: d.kind,
                    expected: b.kind,
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use BindingKind::*;

    const TABLE: &[Binding] = &[
        Binding::fragment("params", 0, Uniform),
        Binding::fragment("image", 1, Texture),
        Binding::fragment("image_sampler", 2, Sampler),
    ];

    fn parse(src: &str) -> naga::Module {
        naga::front::wgsl::parse_str(src).expect("test shader parses")
    }

    const MATCHING: &str = r#"
        struct Params { value: vec4<f32> };
        @group(0) @binding(0) var<uniform> params: Params;
        @group(0) @binding(1) var image: texture_2d<f32>;
        @group(0) @binding(2) var image_sampler: sampler;

        @fragment
        fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
            return textureSample(image, image_sampler, uv) * params.value;
        }
    "#;

    #[test]
    fn duplicate_slots_are_rejected() {
        let table = [
            Binding::fragment("a", 0, Texture),
            Binding::fragment("b", 0, Sampler),
        ];
        assert_eq!(
            validate_table(&table),
            Err(BindingError::DuplicateSlot {
                slot: 0,
                first: "a",
                second: "b"
            })
        );
        assert_eq!(validate_table(TABLE), Ok(()));
    }

    #[test]
    fn matching_module_passes() {
        let module = parse(MATCHING);
        assert_eq!(check_against_modules(TABLE, &[&module]), Ok(()));
    }

    #[test]
    fn moved_slot_is_reported() {
        let module = parse(&MATCHING.replace("@binding(2)", "@binding(5)"));
        assert_eq!(
            check_against_modules(TABLE, &[&module]),
            Err(BindingError::WrongSlot {
                name: "image_sampler",
                group: 0,
                found: 5,
                expected: 2
            })
        );
    }

    #[test]
    fn missing_binding_is_reported() {
        let mut table = TABLE.to_vec();
        table.push(Binding::fragment("extra", 3, Texture));
        let module = parse(MATCHING);
        assert_eq!(
            check_against_modules(&table, &[&module]),
            Err(BindingError::Missing { name: "extra" })
        );
    }

    #[test]
    fn unknown_global_is_reported() {
        let module = parse(MATCHING);
        assert!(matches!(
            check_against_modules(&TABLE[..2], &[&module]),
            Err(BindingError::Undeclared { slot: 2, .. })
        ));
    }

    #[test]
    fn kind_mismatch_is_reported() {
        let table = [
            Binding::fragment("params", 0, Uniform),
            Binding::fragment("image", 1, Sampler),
            Binding::fragment("image_sampler", 2, Sampler),
        ];
        let module = parse(MATCHING);
        assert_eq!(
            check_against_modules(&table, &[&module]),
            Err(BindingError::WrongKind {
                name: "image",
                found: Some(Texture),
                expected: Sampler
            })
        );
    }

    #[test]
    fn layout_entries_follow_table() {
        let entries = layout_entries(TABLE);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].binding, 1);
        assert!(matches!(entries[2].ty, wgpu::BindingType::Sampler(_)));
    }
}
