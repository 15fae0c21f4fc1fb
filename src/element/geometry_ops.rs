//! Volume and coordinate queries.

use super::ElementEntity;
use crate::geometry::interpolation::{cross, dot, normalize, sub};
use crate::geometry_error::GeometryError;
use crate::integration::{IpRef, IpTraversal};
use crate::mesh::Domain;
use crate::topology::element_kind::ElementGeometry;

impl ElementEntity {
    /// Coordinates of the element's nodes in local order.
    pub fn node_coordinates(&self, domain: &Domain) -> Result<Vec<[f64; 3]>, GeometryError> {
        let expected = self.kind.number_of_dof_managers();
        if self.dof_managers.len() != expected {
            return Err(GeometryError::DofManagerCountMismatch {
                element: self.number,
                expected,
                found: self.dof_managers.len(),
            });
        }
        (1..=expected)
            .map(|i| self.give_dof_manager(i, domain).map(|dm| dm.coordinates()))
            .collect()
    }

    /// Volume (area, length) attributed to one integration point.
    pub fn compute_volume_around(&self, domain: &Domain, ip: IpRef) -> Result<f64, GeometryError> {
        let gp = self.gauss_point(ip)?;
        let nodes = self.node_coordinates(domain)?;
        let factor = domain
            .cross_section(self.cross_section)?
            .volume_factor(self.spatial_dimension());
        let measure = self
            .kind
            .interpolation()
            .jacobian_measure(gp.local_coordinates(), &nodes)?;
        Ok(measure * gp.weight() * factor)
    }

    /// Sum of [`compute_volume_around`](Self::compute_volume_around) over the
    /// points of every integration rule.
    pub fn compute_volume_area_or_length(&self, domain: &Domain) -> Result<f64, GeometryError> {
        let nodes = self.node_coordinates(domain)?;
        let factor = domain
            .cross_section(self.cross_section)?
            .volume_factor(self.spatial_dimension());
        let interp = self.kind.interpolation();
        IpTraversal::new(&self.rules).try_sum(|_, gp| {
            Ok(interp.jacobian_measure(gp.local_coordinates(), &nodes)? * gp.weight() * factor)
        })
    }

    /// Volume of a 3-D element; zero for every other dimension.
    pub fn compute_volume(&self, domain: &Domain) -> Result<f64, GeometryError> {
        self.measure_if_dimension(3, domain)
    }

    /// Area of a 2-D element; zero for every other dimension.
    pub fn compute_area(&self, domain: &Domain) -> Result<f64, GeometryError> {
        self.measure_if_dimension(2, domain)
    }

    /// Length of a 1-D element; zero for every other dimension.
    pub fn compute_length(&self, domain: &Domain) -> Result<f64, GeometryError> {
        self.measure_if_dimension(1, domain)
    }

    fn measure_if_dimension(&self, dim: usize, domain: &Domain) -> Result<f64, GeometryError> {
        if self.spatial_dimension() == dim {
            self.compute_volume_area_or_length(domain)
        } else {
            Ok(0.0)
        }
    }

    /// Characteristic size: length, sqrt(area) or cbrt(volume).
    pub fn compute_mean_size(&self, domain: &Domain) -> Result<f64, GeometryError> {
        let v = self.compute_volume_area_or_length(domain)?;
        Ok(match self.spatial_dimension() {
            1 => v,
            2 => v.sqrt(),
            _ => v.cbrt(),
        })
    }

    pub fn compute_global_coordinates(
        &self,
        domain: &Domain,
        local: &[f64],
    ) -> Result<[f64; 3], GeometryError> {
        let nodes = self.node_coordinates(domain)?;
        self.kind.interpolation().global_coordinates(local, &nodes)
    }

    /// Reference coordinates of `global`, computed even outside the element,
    /// with a flag telling whether the point lies inside within `tol`.
    pub fn compute_local_coordinates(
        &self,
        domain: &Domain,
        global: [f64; 3],
        tol: f64,
    ) -> Result<(Vec<f64>, bool), GeometryError> {
        let nodes = self.node_coordinates(domain)?;
        self.kind.interpolation().local_coordinates(global, &nodes, tol)
    }

    pub fn compute_ip_global_coordinates(
        &self,
        domain: &Domain,
        ip: IpRef,
    ) -> Result<[f64; 3], GeometryError> {
        let gp = self.gauss_point(ip)?;
        self.compute_global_coordinates(domain, gp.local_coordinates())
    }

    /// Extent of the element along `direction`.
    pub fn give_length_in_dir(
        &self,
        domain: &Domain,
        direction: [f64; 3],
    ) -> Result<f64, GeometryError> {
        let dir = normalize(direction)
            .ok_or_else(|| GeometryError::InvalidGeometry("zero direction".into()))?;
        let nodes = self.node_coordinates(domain)?;
        let (lo, hi) = nodes
            .iter()
            .map(|x| dot(*x, dir))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p), hi.max(p))
            });
        Ok(hi - lo)
    }

    /// Unit normal of a 2-D element's mid plane at its center.
    pub fn compute_mid_plane_normal(&self, domain: &Domain) -> Result<[f64; 3], GeometryError> {
        if self.spatial_dimension() != 2 {
            return Err(GeometryError::InvalidGeometry(format!(
                "mid-plane normal requested from {}-dimensional element {} ({})",
                self.spatial_dimension(),
                self.number,
                self.kind
            )));
        }
        let interp = self.kind.interpolation();
        let nodes = self.node_coordinates(domain)?;
        let j = interp.jacobian(&interp.reference_center(), &nodes)?;
        normalize(cross(j[0], j[1])).ok_or_else(|| {
            GeometryError::InvalidGeometry(format!("element {} is degenerate", self.number))
        })
    }

    /// Arithmetic mean of the node coordinates.
    pub fn centroid(&self, domain: &Domain) -> Result<[f64; 3], GeometryError> {
        let nodes = self.node_coordinates(domain)?;
        let n = nodes.len() as f64;
        let mut c = [0.0; 3];
        for x in &nodes {
            for k in 0..3 {
                c[k] += x[k] / n;
            }
        }
        Ok(c)
    }

    /// Axis-aligned bounding box `(min, max)` of the nodes.
    pub fn bounding_box(&self, domain: &Domain) -> Result<([f64; 3], [f64; 3]), GeometryError> {
        let nodes = self.node_coordinates(domain)?;
        let mut lo = [f64::INFINITY; 3];
        let mut hi = [f64::NEG_INFINITY; 3];
        for x in &nodes {
            for k in 0..3 {
                lo[k] = lo[k].min(x[k]);
                hi[k] = hi[k].max(x[k]);
            }
        }
        Ok((lo, hi))
    }

    /// Distance from `x` to the point `ip`.
    pub(crate) fn ip_distance(
        &self,
        domain: &Domain,
        ip: IpRef,
        x: [f64; 3],
    ) -> Result<f64, GeometryError> {
        let g = self.compute_ip_global_coordinates(domain, ip)?;
        let d = sub(g, x);
        Ok(dot(d, d).sqrt())
    }
}

#[cfg(test)]
mod tests {
    use crate::data::dof::DofManager;
    use crate::data::record::{InputRecord, RecordValue, keys};
    use crate::element::ElementEntity;
    use crate::geometry_error::GeometryError;
    use crate::integration::IpTraversal;
    use crate::material::{LinearElasticMaterial, SimpleCrossSection};
    use crate::mesh::Domain;
    use crate::topology::element_kind::ElementKind;
    use crate::topology::entity_id::EntityId;

    fn id(raw: u64) -> EntityId {
        EntityId::new(raw).unwrap()
    }

    fn brick(nip: i64) -> (Domain, ElementEntity) {
        let mut d = Domain::new(1);
        let corners = [
            [0.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [2.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 3.0],
            [2.0, 0.0, 3.0],
            [2.0, 1.0, 3.0],
            [0.0, 1.0, 3.0],
        ];
        for (i, x) in corners.into_iter().enumerate() {
            d.add_dof_manager(DofManager::node(id(i as u64 + 1), x));
        }
        d.add_material(LinearElasticMaterial::new(1.0, 0.2));
        d.add_cross_section(SimpleCrossSection::default());
        let mut e = ElementEntity::new(id(1), ElementKind::Brick);
        e.initialize_from(
            &InputRecord::new("lspace", 1)
                .with(keys::MATERIAL, RecordValue::Int(1))
                .with(keys::CROSS_SECTION, RecordValue::Int(1))
                .with(keys::NODES, RecordValue::IntList((1..=8).collect()))
                .with(keys::NIP, RecordValue::Int(nip)),
        )
        .unwrap();
        e.post_initialize(&mut d).unwrap();
        (d, e)
    }

    #[test]
    fn brick_volume_and_point_sum_agree() {
        let (d, e) = brick(8);
        let v = e.compute_volume(&d).unwrap();
        assert!((v - 6.0).abs() < 1e-12);
        let sum: f64 = IpTraversal::new(e.rules())
            .refs()
            .map(|ip| e.compute_volume_around(&d, ip).unwrap())
            .sum();
        assert!((sum - v).abs() < 1e-12);
        assert!((e.compute_mean_size(&d).unwrap() - 6f64.cbrt()).abs() < 1e-12);
        assert_eq!(e.compute_area(&d).unwrap(), 0.0);
        assert_eq!(e.compute_length(&d).unwrap(), 0.0);
    }

    #[test]
    fn extents_and_centroid() {
        let (d, e) = brick(1);
        assert!((e.give_length_in_dir(&d, [0.0, 0.0, 5.0]).unwrap() - 3.0).abs() < 1e-12);
        assert_eq!(e.centroid(&d).unwrap(), [1.0, 0.5, 1.5]);
        let (lo, hi) = e.bounding_box(&d).unwrap();
        assert_eq!((lo, hi), ([0.0; 3], [2.0, 1.0, 3.0]));
    }

    #[test]
    fn short_local_coordinates_are_an_error() {
        let (d, e) = brick(1);
        for lc in [&[][..], &[0.0, 0.0][..]] {
            assert!(matches!(
                e.compute_global_coordinates(&d, lc),
                Err(GeometryError::InvalidGeometry(_))
            ));
        }
    }

    #[test]
    fn local_coordinates_of_ip_are_recovered() {
        let (d, e) = brick(8);
        for (ip, gp) in IpTraversal::new(e.rules()).iter() {
            let x = e.compute_ip_global_coordinates(&d, ip).unwrap();
            let (lc, inside) = e.compute_local_coordinates(&d, x, 1e-9).unwrap();
            assert!(inside);
            for (a, b) in lc.iter().zip(gp.local_coordinates()) {
                assert!((a - b).abs() < 1e-9);
            }
        }
    }
}
