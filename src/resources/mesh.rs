use cgmath::{InnerSpace, Vector2, Vector3};

use crate::data_structures::model::ModelVertex;

/**
 * Model files may come without normals. Every vertex then gets the average of
 * the face normals of the triangles it belongs to.
 */
pub fn compute_normals(vertices: &mut [ModelVertex], indices: &[u32]) {
    let mut sums = vec![Vector3::new(0.0f32, 0.0, 0.0); vertices.len()];
    for c in indices.chunks_exact(3) {
        let [i0, i1, i2] = [c[0] as usize, c[1] as usize, c[2] as usize];
        let pos0: Vector3<f32> = vertices[i0].position.into();
        let pos1: Vector3<f32> = vertices[i1].position.into();
        let pos2: Vector3<f32> = vertices[i2].position.into();
        // Area weighted, the cross product is not normalized on purpose
        let face = (pos1 - pos0).cross(pos2 - pos0);
        for i in [i0, i1, i2] {
            sums[i] += face;
        }
    }
    for (v, sum) in vertices.iter_mut().zip(sums) {
        if sum.magnitude2() > 0.0 {
            v.normal = sum.normalize().into();
        }
    }
}

/**
 * Normal maps need a tangent frame per vertex. Files that don't provide tangents
 * get them from the triangle edges and their texture coordinates.
 */
pub fn compute_tangents(vertices: &mut [ModelVertex], indices: &[u32]) {
    let mut triangles_included = vec![0u32; vertices.len()];
    let mut tangents = vec![Vector3::new(0.0f32, 0.0, 0.0); vertices.len()];
    let mut bitangents = vec![Vector3::new(0.0f32, 0.0, 0.0); vertices.len()];

    // We're going to use the triangles, so we need to loop through the
    // indices in chunks of 3
    for c in indices.chunks_exact(3) {
        let [i0, i1, i2] = [c[0] as usize, c[1] as usize, c[2] as usize];
        let v0 = vertices[i0];
        let v1 = vertices[i1];
        let v2 = vertices[i2];

        let pos0: Vector3<_> = v0.position.into();
        let pos1: Vector3<_> = v1.position.into();
        let pos2: Vector3<_> = v2.position.into();

        let uv0: Vector2<_> = v0.tex_coords.into();
        let uv1: Vector2<_> = v1.tex_coords.into();
        let uv2: Vector2<_> = v2.tex_coords.into();

        // Calculate the edges of the triangle
        let delta_pos1 = pos1 - pos0;
        let delta_pos2 = pos2 - pos0;

        // This will give us a direction to calculate the
        // tangent and bitangent
        let delta_uv1 = uv1 - uv0;
        let delta_uv2 = uv2 - uv0;

        // Solving the following system of equations will
        // give us the tangent and bitangent.
        //     delta_pos1 = delta_uv1.x * T + delta_uv1.y * B
        //     delta_pos2 = delta_uv2.x * T + delta_uv2.y * B
        let det = delta_uv1.x * delta_uv2.y - delta_uv1.y * delta_uv2.x;
        if det.abs() < f32::EPSILON {
            // Degenerate texture mapping, nothing to learn from this triangle
            continue;
        }
        let r = 1.0 / det;
        let tangent = (delta_pos1 * delta_uv2.y - delta_pos2 * delta_uv1.y) * r;
        let bitangent = (delta_pos2 * delta_uv1.x - delta_pos1 * delta_uv2.x) * r;

        for i in [i0, i1, i2] {
            tangents[i] += tangent;
            bitangents[i] += bitangent;
            triangles_included[i] += 1;
        }
    }

    // Average the tangents/bitangents
    for (i, n) in triangles_included.into_iter().enumerate() {
        let v = &mut vertices[i];
        if n == 0 {
            let (tangent, bitangent) = fallback_frame(v.normal.into());
            v.tangent = tangent.into();
            v.bitangent = bitangent.into();
            continue;
        }
        let denom = 1.0 / n as f32;
        v.tangent = (tangents[i] * denom).into();
        v.bitangent = (bitangents[i] * denom).into();
    }
}

/// Any frame perpendicular to `normal`, for vertices without usable texture coordinates.
fn fallback_frame(normal: Vector3<f32>) -> (Vector3<f32>, Vector3<f32>) {
    let normal = if normal.magnitude2() > 0.0 {
        normal.normalize()
    } else {
        Vector3::unit_z()
    };
    let helper = if normal.x.abs() < 0.9 {
        Vector3::unit_x()
    } else {
        Vector3::unit_y()
    };
    let tangent = helper.cross(normal).normalize();
    (tangent, normal.cross(tangent))
}

/// glTF stores the bitangent sign in the tangent's `w`.
pub fn bitangent_from(normal: [f32; 3], tangent: [f32; 4]) -> [f32; 3] {
    let normal: Vector3<f32> = normal.into();
    let tangent: cgmath::Vector4<f32> = tangent.into();
    (normal.cross(tangent.truncate()) * tangent.w).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Vec<ModelVertex> {
        [([0.0, 0.0, 0.0], [0.0, 0.0]), ([1.0, 0.0, 0.0], [1.0, 0.0]), ([0.0, 1.0, 0.0], [0.0, 1.0])]
            .into_iter()
            .map(|(position, tex_coords)| ModelVertex {
                position,
                tex_coords,
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn normals_face_the_counter_clockwise_side() {
        let mut vertices = triangle();
        compute_normals(&mut vertices, &[0, 1, 2]);
        for v in &vertices {
            assert_eq!(v.normal, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn tangents_follow_the_uv_axes() {
        let mut vertices = triangle();
        compute_tangents(&mut vertices, &[0, 1, 2]);
        for v in &vertices {
            assert_eq!(v.tangent, [1.0, 0.0, 0.0]);
            assert_eq!(v.bitangent, [0.0, 1.0, 0.0]);
        }
    }

    #[test]
    fn degenerate_uvs_get_a_perpendicular_frame() {
        let mut vertices = triangle();
        for v in &mut vertices {
            v.tex_coords = [0.5, 0.5];
            v.normal = [0.0, 0.0, 1.0];
        }
        compute_tangents(&mut vertices, &[0, 1, 2]);
        for v in &vertices {
            let t: Vector3<f32> = v.tangent.into();
            let n: Vector3<f32> = v.normal.into();
            assert!(t.dot(n).abs() < 1e-6);
            assert!((t.magnitude() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn bitangent_sign_comes_from_w() {
        assert_eq!(bitangent_from([0.0, 0.0, 1.0], [1.0, 0.0, 0.0, 1.0]), [0.0, 1.0, 0.0]);
        assert_eq!(bitangent_from([0.0, 0.0, 1.0], [1.0, 0.0, 0.0, -1.0]), [0.0, -1.0, 0.0]);
    }
}
