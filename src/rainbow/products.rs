//! Fields exported to Rainbow volumes and their fixed dynamic ranges

/// Rainbow rendering of one MDV field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RainbowProduct {
    /// MDV short field name
    pub field: &'static str,
    /// Rainbow data type, also the file name suffix
    pub data_type: &'static str,
    /// Name of the slice element carrying the dynamic range
    pub dyn_element: &'static str,
    /// Lowest representable physical value (code 1)
    pub min: f64,
    /// Highest representable physical value
    pub max: f64,
}

impl RainbowProduct {
    /// Physical width of one 8-bit code
    pub fn step(&self) -> f64 {
        (self.max - self.min) / 254.0
    }

    /// File name suffix, e.g. `00dBZ.vol`
    pub fn extension(&self) -> String {
        format!("00{}.vol", self.data_type)
    }
}

/// The allow-list: only these fields are decoded and exported.
pub const PRODUCTS: &[RainbowProduct] = &[
    RainbowProduct {
        field: "DBZ",
        data_type: "dBZ",
        dyn_element: "dynz",
        min: -31.5,
        max: 95.5,
    },
    RainbowProduct {
        field: "DBZ_F",
        data_type: "dBuZ",
        dyn_element: "dynz",
        min: -31.5,
        max: 95.5,
    },
    RainbowProduct {
        field: "VEL",
        data_type: "V",
        dyn_element: "dynv",
        min: -32.0,
        max: 32.0,
    },
    RainbowProduct {
        field: "WIDTH",
        data_type: "W",
        dyn_element: "dynw",
        min: 0.0,
        max: 16.0,
    },
    RainbowProduct {
        field: "PHIDP",
        data_type: "PhiDP",
        dyn_element: "dynphidp",
        min: 0.0,
        max: 360.0,
    },
    RainbowProduct {
        field: "KDP",
        data_type: "KDP",
        dyn_element: "dynkdp",
        min: -5.0,
        max: 20.0,
    },
    RainbowProduct {
        field: "RHOHV",
        data_type: "RhoHV",
        dyn_element: "dynrhohv",
        min: 0.0,
        max: 1.0,
    },
    RainbowProduct {
        field: "SNR",
        data_type: "SNR",
        dyn_element: "dynsnr",
        min: -10.0,
        max: 60.0,
    },
    RainbowProduct {
        field: "ZDR",
        data_type: "ZDR",
        dyn_element: "dynzdr",
        min: -8.0,
        max: 12.0,
    },
];

/// Look up the product for an MDV field name
pub fn product_for(field: &str) -> Option<&'static RainbowProduct> {
    PRODUCTS.iter().find(|p| p.field == field)
}
