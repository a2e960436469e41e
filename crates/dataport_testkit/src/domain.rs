//! Sample domain used by fixtures and integration tests.
//!
//! Two entities with different identifier kinds: [`Person`] uses a
//! generated integer, [`Department`] a generated [`EntityId`].

use dataport_core::{
    CollectionKey, CoreError, CoreResult, Entity, EntityId, FetchOptions, Predicate, Repository,
    ValidationRules,
};
use serde::{Deserialize, Serialize};

/// Collection of [`Person`] rows.
pub const PERSONS: CollectionKey<Person> = CollectionKey::new("persons");

/// Collection of [`Department`] rows.
pub const DEPARTMENTS: CollectionKey<Department> = CollectionKey::new("departments");

/// A person, identified by a generated integer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Identifier; `0` until saved.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Contact address.
    pub email: String,
    /// Age in years.
    pub age: u8,
    /// Owning department, if any.
    pub department: Option<EntityId>,
}

impl Person {
    /// Creates an unsaved person without a department.
    pub fn new(name: impl Into<String>, email: impl Into<String>, age: u8) -> Self {
        Self {
            id: 0,
            name: name.into(),
            email: email.into(),
            age,
            department: None,
        }
    }

    /// Assigns the person to a department.
    #[must_use]
    pub fn in_department(mut self, department: EntityId) -> Self {
        self.department = Some(department);
        self
    }
}

impl Entity for Person {
    type Id = i64;

    fn id(&self) -> &i64 {
        &self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn rules() -> ValidationRules<Self> {
        ValidationRules::<Self>::new()
            .required("name", |p| p.name.as_str())
            .max_length("name", 64, |p| p.name.as_str())
            .field("email", "must contain '@'", |p| p.email.contains('@'))
            .range("age", 0..=150, |p| p.age)
    }
}

/// A department, identified by a generated UUID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    /// Identifier; nil until saved.
    pub id: EntityId,
    /// Short unique code, e.g. `ENG`.
    pub code: String,
    /// Display name.
    pub name: String,
}

impl Department {
    /// Creates an unsaved department.
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: EntityId::nil(),
            code: code.into(),
            name: name.into(),
        }
    }
}

impl Entity for Department {
    type Id = EntityId;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn rules() -> ValidationRules<Self> {
        ValidationRules::<Self>::new()
            .required("code", |d| d.code.as_str())
            .max_length("code", 8, |d| d.code.as_str())
            .required("name", |d| d.name.as_str())
    }
}

/// Data access for [`Person`].
pub trait PersonRepository: Repository<Person> {
    /// Returns the members of a department ordered by name.
    ///
    /// # Errors
    ///
    /// Returns the provider's error if the collection cannot be read.
    fn find_by_department(&self, department: EntityId) -> CoreResult<Vec<Person>> {
        self.fetch(
            &FetchOptions::new()
                .filter(Predicate::new(move |p: &Person| p.department == Some(department)))
                .sort_by(|p: &Person| p.name.clone()),
        )
    }

    /// Returns the person with this email address.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if nobody has it and `AmbiguousResult` if the
    /// address is shared.
    fn find_by_email(&self, email: &str) -> CoreResult<Person> {
        let email = email.to_string();
        self.get_single(&Predicate::new(move |p: &Person| p.email == email))
    }

    /// Returns people whose age lies in `min..=max`.
    ///
    /// # Errors
    ///
    /// Returns `Argument` if `min > max`.
    fn find_by_age(&self, min: u8, max: u8) -> CoreResult<Vec<Person>> {
        if min > max {
            return Err(CoreError::argument(format!("empty age range {min}..={max}")));
        }
        self.fetch(&FetchOptions::new().filter(Predicate::new(move |p: &Person| {
            (min..=max).contains(&p.age)
        })))
    }
}

/// Data access for [`Department`].
pub trait DepartmentRepository: Repository<Department> {
    /// Returns the department with this code.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no department has the code.
    fn find_by_code(&self, code: &str) -> CoreResult<Department> {
        let code = code.to_string();
        self.get_single(&Predicate::new(move |d: &Department| d.code == code))
    }
}
