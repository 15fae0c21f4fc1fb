//! Homogeneous cross section with constant geometric properties.

use super::{Capabilities, CrossSection};

/// Constant thickness (2-D) and area (1-D) section.
#[derive(Clone, Debug, PartialEq)]
pub struct SimpleCrossSection {
    pub thickness: f64,
    pub area: f64,
    capabilities: Capabilities,
}

impl SimpleCrossSection {
    pub fn new(thickness: f64, area: f64) -> Self {
        Self {
            thickness,
            area,
            capabilities: Capabilities::ALL,
        }
    }

    pub fn with_capabilities(mut self, caps: Capabilities) -> Self {
        self.capabilities = caps;
        self
    }
}

impl Default for SimpleCrossSection {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

impl CrossSection for SimpleCrossSection {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn volume_factor(&self, dim: usize) -> f64 {
        match dim {
            1 => self.area,
            2 => self.thickness,
            _ => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_factor_by_dimension() {
        let cs = SimpleCrossSection::new(0.5, 2.0);
        assert_eq!(cs.volume_factor(1), 2.0);
        assert_eq!(cs.volume_factor(2), 0.5);
        assert_eq!(cs.volume_factor(3), 1.0);
    }
}
