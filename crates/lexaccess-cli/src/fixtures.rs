//! Snapshot document shared by the subcommand tests.

use std::path::{Path, PathBuf};

pub(crate) const AT: &str = "2026-06-15T09:00:00Z";

const STATE: &str = r#"
principals:
  - id: 1
    approved: true
    role: User
    institution_id: 10
  - id: 2
    approved: true
    role: User
  - id: 3
    approved: true
    role: User
  - id: 4
    approved: true
    role: User
    institution_id: 20
  - id: 9
    approved: true
    is_global_admin: true
    role: Admin
institutions:
  - id: 10
    name: Riverside Law School
    is_active: true
  - id: 20
    name: Lakeside Chambers
    is_active: true
memberships:
  - principal_id: 1
    institution_id: 10
    member_type: student
    status: approved
    is_active: true
    approved_at: 2026-01-05T08:00:00Z
  - principal_id: 4
    institution_id: 20
    member_type: staff
    status: approved
    is_active: true
products:
  - id: 200
    name: Court of Appeal Reports
    is_active: true
    allows_individual_purchase: true
    individual_price: "250.00"
content_items:
  - id: 5000
    title: Civil Appeal 12 of 2024
    is_premium: true
    product_ids: [200]
    country_code: KE
  - id: 5001
    title: Constitution of Kenya
    is_premium: false
ownerships:
  - principal_id: 3
    product_id: 200
institution_subscriptions:
  - institution_id: 10
    product_id: 200
    status: active
    start_date: 2026-01-01T00:00:00Z
    end_date: 2026-12-31T23:59:59Z
  - institution_id: 20
    product_id: 200
    status: suspended
    start_date: 2026-01-01T00:00:00Z
    end_date: 2026-12-31T23:59:59Z
vat_rates:
  - id: 1
    code: VAT16
    rate_percent: "16"
    is_active: true
  - id: 2
    code: VAT8
    rate_percent: "8"
    is_active: true
vat_rules:
  - id: 1
    purpose: PublicLegalDocumentPurchase
    country_code: KE
    vat_rate_id: 1
    priority: 10
    is_active: true
"#;

/// Write the shared snapshot into `dir`.
pub(crate) fn write_state(dir: &Path) -> PathBuf {
    let path = dir.join("state.yaml");
    std::fs::write(&path, STATE).unwrap();
    path
}
