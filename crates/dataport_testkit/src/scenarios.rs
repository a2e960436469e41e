//! Sample scenarios.

use crate::domain::{Department, Person, DEPARTMENTS, PERSONS};
use dataport_core::{CoreError, CoreResult, EntityId, Scenario, ScenarioData};

/// Name of the asset holding the company handbook.
pub const HANDBOOK: &str = "handbook.md";

/// A small company: three departments and five people.
///
/// People are pushed without identifiers and receive `1..=5` in the order
/// listed: Ada, Grace, Linus, Margaret, Dennis.
#[derive(Debug, Default, Clone, Copy)]
pub struct CompanyScenario;

impl CompanyScenario {
    /// Department codes in seeding order.
    pub const DEPARTMENT_CODES: [&'static str; 3] = ["ENG", "OPS", "RES"];
}

impl Scenario for CompanyScenario {
    fn initialize_entities(&self, data: &ScenarioData) -> CoreResult<()> {
        data.push(
            DEPARTMENTS,
            [
                Department::new("ENG", "Engineering"),
                Department::new("OPS", "Operations"),
                Department::new("RES", "Research"),
            ],
        )?;

        let ids: Vec<EntityId> = data.read(DEPARTMENTS, |rows| rows.iter().map(|d| d.id).collect())?;
        let &[eng, ops, res] = ids.as_slice() else {
            return Err(CoreError::state("departments were not seeded"));
        };

        data.push(
            PERSONS,
            [
                Person::new("Ada", "ada@example.com", 36).in_department(eng),
                Person::new("Grace", "grace@example.com", 45).in_department(eng),
                Person::new("Linus", "linus@example.com", 28).in_department(ops),
                Person::new("Margaret", "margaret@example.com", 33).in_department(res),
                Person::new("Dennis", "dennis@example.com", 41),
            ],
        )
    }

    fn initialize_assets(&self, data: &ScenarioData) -> CoreResult<()> {
        data.put_asset(HANDBOOK, b"# Handbook\n\nBe kind.\n".to_vec())
    }
}

/// A scenario with no rows and no assets.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyScenario;

impl Scenario for EmptyScenario {
    fn initialize_entities(&self, _data: &ScenarioData) -> CoreResult<()> {
        Ok(())
    }
}

/// A scenario seeding a list of people.
#[derive(Debug, Clone)]
pub struct CrowdScenario {
    people: Vec<Person>,
}

impl CrowdScenario {
    /// Seeds exactly these people.
    #[must_use]
    pub fn new(people: Vec<Person>) -> Self {
        Self { people }
    }

    /// Seeds `count` people named `person-<n>` aged `20 + n % 50`.
    #[must_use]
    pub fn sized(count: usize) -> Self {
        let people = (0..count)
            .map(|n| {
                let age = u8::try_from(20 + n % 50).unwrap_or(u8::MAX);
                Person::new(format!("person-{n}"), format!("person-{n}@example.com"), age)
            })
            .collect();
        Self { people }
    }
}

impl Scenario for CrowdScenario {
    fn initialize_entities(&self, data: &ScenarioData) -> CoreResult<()> {
        data.push(PERSONS, self.people.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataport_core::ScenarioInstance;

    #[test]
    fn company_links_people_to_departments() {
        let instance = ScenarioInstance::load(CompanyScenario).unwrap();
        let data = instance.data();

        assert_eq!(data.len(DEPARTMENTS).unwrap(), 3);
        let people = data.collection(PERSONS).unwrap();
        let ids: Vec<_> = people.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);

        let departments = data.collection(DEPARTMENTS).unwrap();
        assert_eq!(people[0].department, Some(departments[0].id));
        assert_eq!(people[4].department, None);
        assert!(data.has_asset(HANDBOOK));
    }

    #[test]
    fn crowd_is_sized() {
        let instance = ScenarioInstance::load(CrowdScenario::sized(120)).unwrap();
        assert_eq!(instance.data().len(PERSONS).unwrap(), 120);
    }

    #[test]
    fn empty_has_nothing() {
        let instance = ScenarioInstance::load(EmptyScenario).unwrap();
        assert!(instance.data().collection_names().is_empty());
        assert!(instance.data().asset_names().is_empty());
    }
}
