//! Demo tables loaded at startup.

use rust_decimal::Decimal;

use crate::domain::company::{Company, CompanyId};
use crate::domain::product::{Product, ProductId};
use crate::domain::supplier::{Supplier, SupplierId};

use super::Catalog;

pub fn seed_products() -> Vec<Product> {
    vec![
        Product {
            product_id: ProductId("PROD-001".to_string()),
            product_name: "Advanced Polymer Resin (APR-200)".to_string(),
            category: "Specialty Chemicals / Composites".to_string(),
            unit_of_measure: "Kilogram (KG)".to_string(),
            standard_cost_per_kg: Decimal::new(1850, 2),
            manufacturing_lead_time: 15,
            raw_material1: "Isophthalic Acid: 70%".to_string(),
            raw_material2: "Glycol Ether: 20%".to_string(),
            raw_material3: "Cobalt Octoate: 10%".to_string(),
            storage_requirements: "Cool, dry environment; temperature < 30°C".to_string(),
        },
        Product {
            product_id: ProductId("PROD-002".to_string()),
            product_name: "High-Performance Epoxy Resin (HPE-350)".to_string(),
            category: "Specialty Chemicals / Adhesives".to_string(),
            unit_of_measure: "Kilogram (KG)".to_string(),
            standard_cost_per_kg: Decimal::new(2275, 2),
            manufacturing_lead_time: 12,
            raw_material1: "Bisphenol A: 65%".to_string(),
            raw_material2: "Epichlorohydrin: 25%".to_string(),
            raw_material3: "Catalyst Mix: 10%".to_string(),
            storage_requirements: "Store in sealed containers; temperature 15-25°C".to_string(),
        },
    ]
}

pub fn seed_suppliers() -> Vec<Supplier> {
    vec![
        Supplier {
            supplier_id: SupplierId("CCSI-910-S".to_string()),
            supplier_name: "ChemCore Solutions Inc.".to_string(),
            primary_contact: "Sarah Johnson (Sales Director)".to_string(),
            phone: "+1 (555) 301-4567".to_string(),
            email: "sjohnson@chemcoresolutions.com".to_string(),
            address: "22 East Harbor Blvd, Houston, TX, 77002, USA".to_string(),
            certification: "ISO 9001:2015, REACH Compliant".to_string(),
            payment_terms_accepted: "Net 30/60 Days".to_string(),
            product_focus: "Custom chemical formulations, bulk industrial solvents, and polymer intermediates."
                .to_string(),
            description: "Well-established, mid-sized chemical manufacturer known for on-time delivery and flexible ordering. Stellar's preferred domestic supplier for specialty resins."
                .to_string(),
        },
        Supplier {
            supplier_id: SupplierId("GPL-445-S".to_string()),
            supplier_name: "Global Polymers Ltd.".to_string(),
            primary_contact: "Michael Chen (Account Manager)".to_string(),
            phone: "+1 (555) 892-3341".to_string(),
            email: "mchen@globalpolymers.com".to_string(),
            address: "789 Industrial Park Way, Newark, NJ, 07102, USA".to_string(),
            certification: "ISO 9001:2015, ISO 14001:2015, FDA Registered".to_string(),
            payment_terms_accepted: "Net 45/90 Days".to_string(),
            product_focus: "High-performance epoxy resins, polyurethane systems, and specialty coatings."
                .to_string(),
            description: "International supplier with strong technical support team. Known for premium quality products and competitive pricing on bulk orders."
                .to_string(),
        },
    ]
}

pub fn seed_companies() -> Vec<Company> {
    vec![
        Company {
            company_id: CompanyId("COMP-001".to_string()),
            company_name: "Stellar Manufacturing Corp.".to_string(),
            division: "Advanced Materials Procurement".to_string(),
            procurement_agent: "David Chen".to_string(),
            agent_id: "DC-88-PA".to_string(),
            default_payment_terms: "Net 45 Days".to_string(),
            annual_budget: Decimal::new(45_000_000, 0),
            primary_location: "1450 Innovation Drive, Suite 200, Indianapolis, IN, 46204, USA"
                .to_string(),
            industry_focus: "Precision Engineering & Robotics".to_string(),
            erp_system: "SAP S/4HANA (MM)".to_string(),
        },
        Company {
            company_id: CompanyId("COMP-002".to_string()),
            company_name: "Stellar Manufacturing Corp.".to_string(),
            division: "European Materials Procurement".to_string(),
            procurement_agent: "Emma Schmidt".to_string(),
            agent_id: "ES-92-PA".to_string(),
            default_payment_terms: "Net 30 Days".to_string(),
            annual_budget: Decimal::new(38_000_000, 0),
            primary_location: "45 Tech Boulevard, Munich, Bavaria, 80331, Germany".to_string(),
            industry_focus: "Automotive Components & Aerospace".to_string(),
            erp_system: "SAP S/4HANA (MM)".to_string(),
        },
    ]
}

/// The three tables the agent tools read from.
#[derive(Clone, Debug, Default)]
pub struct Catalogs {
    pub products: Catalog<Product>,
    pub suppliers: Catalog<Supplier>,
    pub companies: Catalog<Company>,
}

impl Catalogs {
    pub fn seeded() -> Self {
        Self {
            products: Catalog::new(seed_products()),
            suppliers: Catalog::new(seed_suppliers()),
            companies: Catalog::new(seed_companies()),
        }
    }
}
