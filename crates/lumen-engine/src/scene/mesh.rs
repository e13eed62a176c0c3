use bytemuck::{Pod, Zeroable};

/// Interleaved vertex: position, normal, texture coordinate.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    const ATTRIBS: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

const DEFAULT_NORMAL: [f32; 3] = [0.0, 1.0, 0.0];
const DEFAULT_UV: [f32; 2] = [0.0, 0.0];

/// Triangle mesh with one vertex per index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Flattens a triangulated OBJ mesh: every face corner becomes its own
    /// vertex and indices run sequentially. Missing or out-of-range normals
    /// and texture coordinates take defaults.
    pub fn from_obj(mesh: &tobj::Mesh) -> Self {
        let corner_count = mesh.indices.len();
        let mut vertices = Vec::with_capacity(corner_count);

        for (corner, &pi) in mesh.indices.iter().enumerate() {
            let pi = pi as usize;
            let Some(position) = read3(&mesh.positions, pi) else {
                log::warn!("obj: position index {pi} out of range; dropping mesh");
                return Self::default();
            };

            let ni = mesh.normal_indices.get(corner).map_or(pi, |&i| i as usize);
            let ti = mesh.texcoord_indices.get(corner).map_or(pi, |&i| i as usize);

            vertices.push(Vertex {
                position,
                normal: read3(&mesh.normals, ni).unwrap_or(DEFAULT_NORMAL),
                uv: read2(&mesh.texcoords, ti).unwrap_or(DEFAULT_UV),
            });
        }

        Self {
            vertices,
            indices: (0..corner_count as u32).collect(),
        }
    }

    /// Appends another mesh, offsetting its indices.
    pub fn append(&mut self, other: MeshData) {
        let base = self.vertices.len() as u32;
        self.vertices.extend(other.vertices);
        self.indices.extend(other.indices.into_iter().map(|i| i + base));
    }
}

fn read3(data: &[f32], index: usize) -> Option<[f32; 3]> {
    data.get(index * 3..index * 3 + 3).map(|s| [s[0], s[1], s[2]])
}

fn read2(data: &[f32], index: usize) -> Option<[f32; 2]> {
    data.get(index * 2..index * 2 + 2).map(|s| [s[0], s[1]])
}
