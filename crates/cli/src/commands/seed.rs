//! Seed an empty database with outlets, users and the catalogue.
//!
//! The built-in data lives in `crates/cli/seed/default.yaml`. A file passed
//! with `--file` may contain any of the same top-level sections; each one it
//! contains replaces the built-in section. Seeding is skipped entirely when
//! the database already has users.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use booklist_core::UserRole;
use booklist_server::db::option_items::CreateOptionItem;
use booklist_server::db::{
    self, BooklistRepository, OptionItemRepository, OutletRepository, SchoolRepository,
    UserRepository,
};
use booklist_server::models::{NewBooklist, NewOutlet, NewUser};
use booklist_server::services::auth::hash_password;

const DEFAULT_SEED: &str = include_str!("../../seed/default.yaml");

#[derive(Debug, Clone, Deserialize)]
pub struct SeedAdmin {
    pub username: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedStaff {
    pub username: String,
    pub name: String,
    /// Outlet code.
    pub outlet: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedOptionItem {
    pub name: String,
    pub key: String,
    pub enabled: bool,
    pub default_checked: bool,
}

/// Everything `seed` writes.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedData {
    pub admin: SeedAdmin,
    pub outlets: Vec<NewOutlet>,
    pub schools: Vec<String>,
    pub staff_password: String,
    pub staff: Vec<SeedStaff>,
    pub option_items: Vec<SeedOptionItem>,
    pub booklists: Vec<NewBooklist>,
}

/// Sections of a user-supplied seed file.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct SeedOverrides {
    admin: Option<SeedAdmin>,
    outlets: Option<Vec<NewOutlet>>,
    schools: Option<Vec<String>>,
    staff_password: Option<String>,
    staff: Option<Vec<SeedStaff>>,
    option_items: Option<Vec<SeedOptionItem>>,
    booklists: Option<Vec<NewBooklist>>,
}

impl SeedData {
    /// The built-in seed data.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded YAML does not parse.
    pub fn builtin() -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(DEFAULT_SEED)
    }

    /// Built-in data with the sections of `yaml` replacing their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if either document does not parse.
    pub fn with_overrides(yaml: &str) -> Result<Self, serde_yaml::Error> {
        let mut data = Self::builtin()?;
        let overrides: SeedOverrides = serde_yaml::from_str(yaml)?;

        if let Some(admin) = overrides.admin {
            data.admin = admin;
        }
        if let Some(outlets) = overrides.outlets {
            data.outlets = outlets;
        }
        if let Some(schools) = overrides.schools {
            data.schools = schools;
        }
        if let Some(password) = overrides.staff_password {
            data.staff_password = password;
        }
        if let Some(staff) = overrides.staff {
            data.staff = staff;
        }
        if let Some(items) = overrides.option_items {
            data.option_items = items;
        }
        if let Some(booklists) = overrides.booklists {
            data.booklists = booklists;
        }
        Ok(data)
    }
}

/// Seed the database.
///
/// # Errors
///
/// Returns an error if the seed file cannot be read or parsed, or a database
/// write fails.
pub async fn run(file: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let data = match file {
        Some(path) => {
            info!(path = %path.display(), "Loading seed overrides");
            let content = tokio::fs::read_to_string(path).await?;
            SeedData::with_overrides(&content)?
        }
        None => SeedData::builtin()?,
    };

    let database_url = super::database_url().ok_or("BOOKLIST_DATABASE_URL not set")?;
    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let users = UserRepository::new(&pool);
    if users.count().await? > 0 {
        info!("Database already seeded, skipping");
        return Ok(());
    }

    users
        .create(
            &NewUser {
                username: data.admin.username.clone(),
                password: String::new(),
                name: data.admin.name.clone(),
                role: UserRole::Admin,
                outlet_id: None,
                active: true,
            },
            &hash_password(&data.admin.password)?,
        )
        .await?;
    info!("Seeded admin user");

    let outlets = OutletRepository::new(&pool);
    for outlet in &data.outlets {
        outlets.create(outlet).await?;
    }
    info!(count = data.outlets.len(), "Seeded outlets");

    let schools = SchoolRepository::new(&pool);
    for name in &data.schools {
        schools.create(name).await?;
    }
    info!(count = data.schools.len(), "Seeded schools");

    let staff_hash = hash_password(&data.staff_password)?;
    for staff in &data.staff {
        let outlet_id = match &staff.outlet {
            Some(code) => Some(
                outlets
                    .get_by_code(code)
                    .await?
                    .ok_or_else(|| format!("staff {} references unknown outlet {code}", staff.username))?
                    .id,
            ),
            None => None,
        };
        users
            .create(
                &NewUser {
                    username: staff.username.clone(),
                    password: String::new(),
                    name: staff.name.clone(),
                    role: UserRole::Staff,
                    outlet_id,
                    active: true,
                },
                &staff_hash,
            )
            .await?;
    }
    info!(count = data.staff.len(), "Seeded staff users");

    let option_items = OptionItemRepository::new(&pool);
    for item in &data.option_items {
        option_items
            .create(CreateOptionItem {
                name: &item.name,
                key: &item.key,
                enabled: item.enabled,
                default_checked: item.default_checked,
            })
            .await?;
    }
    info!(count = data.option_items.len(), "Seeded option items");

    let booklists = BooklistRepository::new(&pool);
    for booklist in &data.booklists {
        booklists.create(booklist).await?;
    }
    info!(count = data.booklists.len(), "Seeded booklists");

    info!("Database seeding completed!");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use booklist_core::Amount;

    #[test]
    fn test_builtin_seed_parses() {
        let data = SeedData::builtin().unwrap();
        assert_eq!(data.admin.username, "admin");
        assert_eq!(data.outlets.len(), 3);
        assert_eq!(data.outlets[0].code, "OUT-001");
        assert!(data.outlets.iter().all(|o| o.active));
        assert_eq!(data.schools.len(), 3);
        assert_eq!(data.staff.len(), 3);
        assert_eq!(data.option_items.len(), 5);
        assert!(data.option_items[1].default_checked);
    }

    #[test]
    fn test_builtin_booklist_items_add_up() {
        let data = SeedData::builtin().unwrap();
        let booklist = &data.booklists[0];
        assert_eq!(booklist.code, "VCH-GR1-ALL");
        assert_eq!(booklist.items.len(), 18);

        let item_sum: Amount = booklist
            .items
            .iter()
            .map(booklist_server::models::NewBooklistItem::line_amount)
            .sum();
        assert_eq!(item_sum, Amount::from_minor(58_900));
        assert_eq!(booklist.resolved_total(), item_sum);
    }

    #[test]
    fn test_overrides_replace_only_given_sections() {
        let data = SeedData::with_overrides(
            "outlets:\n  - name: Gan Outlet\n    code: OUT-010\nschools: [Gan School]\n",
        )
        .unwrap();
        assert_eq!(data.outlets.len(), 1);
        assert_eq!(data.outlets[0].name, "Gan Outlet");
        assert_eq!(data.schools, vec!["Gan School".to_owned()]);
        assert_eq!(data.staff.len(), 3);
        assert_eq!(data.booklists.len(), 1);
    }

    #[test]
    fn test_unknown_override_section_rejected() {
        assert!(SeedData::with_overrides("vendors: []\n").is_err());
    }
}
