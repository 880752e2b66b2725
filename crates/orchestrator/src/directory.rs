//! The emergency contact directory.

use std::collections::HashMap;

use alert_core::{Contact, MessageTemplate};
use alert_store::{contact as contact_store, template as template_store, validation, Database};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::OrchestratorError;

/// Holds the prioritized contact list and message templates.
///
/// Contacts and templates live in memory and are optionally backed by
/// the alert-store database: loaded once at startup, written through on
/// every mutation. Store failures are logged and degrade to memory-only
/// operation - configuration trouble must never take the alert path down.
pub struct ContactDirectory {
    contacts: RwLock<Vec<Contact>>,
    templates: RwLock<HashMap<String, MessageTemplate>>,
    database: Option<Database>,
}

impl Default for ContactDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl ContactDirectory {
    /// Create a memory-only directory seeded with the default
    /// configuration.
    pub fn new() -> Self {
        let directory = Self {
            contacts: RwLock::new(Self::default_contacts()),
            templates: RwLock::new(Self::default_templates()),
            database: None,
        };
        info!("contact directory initialized with default configuration");
        directory
    }

    /// Create a directory backed by the database.
    ///
    /// Loads persisted contacts and templates; when the store is empty
    /// the default configuration is seeded and persisted, so the system
    /// never operates on an undefined contact set.
    pub async fn with_database(database: Database) -> Self {
        let mut contacts = match contact_store::list_contacts(database.pool()).await {
            Ok(contacts) => contacts,
            Err(e) => {
                warn!("failed to load contacts, starting empty: {}", e);
                Vec::new()
            }
        };

        if contacts.is_empty() {
            info!("no contacts configured, seeding disabled placeholders");
            contacts = Self::default_contacts();
            for contact in &contacts {
                if let Err(e) = contact_store::upsert_contact(database.pool(), contact).await {
                    warn!("failed to persist default contact {}: {}", contact.name, e);
                }
            }
        } else {
            info!("loaded {} emergency contacts", contacts.len());
        }

        let mut templates = HashMap::new();
        match template_store::list_templates(database.pool()).await {
            Ok(stored) if !stored.is_empty() => {
                info!("loaded {} message templates", stored.len());
                for template in stored {
                    templates.insert(template.id.clone(), template);
                }
            }
            Ok(_) => {
                info!("no templates configured, seeding defaults");
                templates = Self::default_templates();
                for template in templates.values() {
                    if let Err(e) = template_store::upsert_template(database.pool(), template).await
                    {
                        warn!("failed to persist default template {}: {}", template.id, e);
                    }
                }
            }
            Err(e) => {
                warn!("failed to load templates, using defaults: {}", e);
                templates = Self::default_templates();
            }
        }

        Self {
            contacts: RwLock::new(contacts),
            templates: RwLock::new(templates),
            database: Some(database),
        }
    }

    /// Contacts sorted ascending by priority; optionally only the
    /// enabled ones.
    pub async fn list(&self, enabled_only: bool) -> Vec<Contact> {
        let mut contacts: Vec<Contact> = self
            .contacts
            .read()
            .await
            .iter()
            .filter(|c| !enabled_only || c.enabled)
            .cloned()
            .collect();
        contacts.sort_by_key(|c| c.priority);
        contacts
    }

    /// Number of configured contacts.
    pub async fn len(&self) -> usize {
        self.contacts.read().await.len()
    }

    /// Whether no contacts are configured.
    pub async fn is_empty(&self) -> bool {
        self.contacts.read().await.is_empty()
    }

    /// Number of enabled contacts.
    pub async fn enabled_count(&self) -> usize {
        self.contacts.read().await.iter().filter(|c| c.enabled).count()
    }

    /// Add or replace a contact, keyed by phone number.
    pub async fn upsert_contact(&self, contact: Contact) -> Result<(), OrchestratorError> {
        validation::validate_contact(&contact)
            .map_err(|e| OrchestratorError::InvalidContact(e.to_string()))?;

        {
            let mut contacts = self.contacts.write().await;
            match contacts.iter_mut().find(|c| c.phone == contact.phone) {
                Some(existing) => *existing = contact.clone(),
                None => contacts.push(contact.clone()),
            }
        }

        if let Some(database) = &self.database {
            if let Err(e) = contact_store::upsert_contact(database.pool(), &contact).await {
                warn!("failed to persist contact {}: {}", contact.name, e);
            }
        }

        info!("contact saved: {} ({})", contact.name, contact.phone);
        Ok(())
    }

    /// Remove a contact by phone number. Returns whether one existed.
    pub async fn remove_contact(&self, phone: &str) -> bool {
        let removed = {
            let mut contacts = self.contacts.write().await;
            let before = contacts.len();
            contacts.retain(|c| c.phone != phone);
            contacts.len() < before
        };

        if let Some(database) = &self.database {
            if let Err(e) = contact_store::delete_contact(database.pool(), phone).await {
                warn!("failed to delete contact {}: {}", phone, e);
            }
        }

        if removed {
            info!("contact removed: {}", phone);
        }
        removed
    }

    /// Get a template by id.
    pub async fn template(&self, id: &str) -> Option<MessageTemplate> {
        self.templates.read().await.get(id).cloned()
    }

    /// Add or replace a template.
    pub async fn upsert_template(&self, template: MessageTemplate) {
        if let Some(database) = &self.database {
            if let Err(e) = template_store::upsert_template(database.pool(), &template).await {
                warn!("failed to persist template {}: {}", template.id, e);
            }
        }

        self.templates
            .write()
            .await
            .insert(template.id.clone(), template);
    }

    /// Disabled placeholder contacts, so a fresh install has a visible,
    /// editable shape but alerts nobody by accident.
    fn default_contacts() -> Vec<Contact> {
        vec![
            Contact::new("Emergency Contact 1", "+1234567890", "Family", 1).disabled(),
            Contact::new("Emergency Contact 2", "+1234567891", "Friend", 2).disabled(),
        ]
    }

    fn default_templates() -> HashMap<String, MessageTemplate> {
        let emergency = MessageTemplate::new(
            "emergency_alert",
            "EMERGENCY ALERT from assistive device user!\n\n\
             Location: {location}\n\
             Time: {timestamp}\n\
             Trigger: {trigger_type}\n\n\
             Please check on the user immediately!",
            vec![
                "location".to_string(),
                "timestamp".to_string(),
                "trigger_type".to_string(),
            ],
        );

        let location_update = MessageTemplate::new(
            "location_update",
            "Location update from assistive device user:\n\n\
             Current location: {location}\n\
             Coordinates: {coordinates}\n\
             Time: {timestamp}",
            vec![
                "location".to_string(),
                "coordinates".to_string(),
                "timestamp".to_string(),
            ],
        );

        let mut templates = HashMap::new();
        templates.insert(emergency.id.clone(), emergency);
        templates.insert(location_update.id.clone(), location_update);
        templates
    }
}
