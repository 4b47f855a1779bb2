use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::{
    error::DisplayErrorContext,
    operation::query::builders::QueryFluentBuilder,
    types::{AttributeValue, ReturnValue},
    Client,
};
use chrono::{DateTime, Utc};
use derive_new::new;
use serde::{de::DeserializeOwned, Serialize};

use crate::adherence::AdherenceLog;
use crate::errors::Error;
use crate::medications::{Medication, MedicationPatch, MedicationState, ENTITY as MEDICATION};
use crate::time::DateRange;

use super::{AdherenceLogStore, MedicationStore};

type Item = HashMap<String, AttributeValue>;

const USER_KEY: &str = "userId";
const ID_KEY: &str = "id";
const SCHEDULED_KEY: &str = "scheduledKey";

/// DynamoDB-backed store.
///
/// Medications table: partition `userId`, sort `id`.
/// Adherence logs table: partition `userId`, sort `scheduledKey`
/// (fixed-width UTC scheduled time, then the log id).
#[derive(Clone, new)]
pub struct DynamoStore {
    client: Client,
    medications_table: String,
    logs_table: String,
}

impl DynamoStore {
    fn user_query(&self, table: &str, user_id: &str) -> QueryFluentBuilder {
        self.client
            .query()
            .table_name(table)
            .expression_attribute_names("#uid", USER_KEY)
            .expression_attribute_values(":uid", AttributeValue::S(user_id.to_string()))
    }

    /// Single `UpdateItem` guarded by `attribute_exists(id)` on the
    /// (owner, id) key, so ownership check and write are one request.
    async fn conditional_update(
        &self,
        user_id: &str,
        id: &str,
        changes: UpdateFields,
    ) -> Result<Medication, Error> {
        let mut request = self
            .client
            .update_item()
            .table_name(&self.medications_table)
            .key(USER_KEY, AttributeValue::S(user_id.to_string()))
            .key(ID_KEY, AttributeValue::S(id.to_string()))
            .condition_expression("attribute_exists(#id)")
            .expression_attribute_names("#id", ID_KEY)
            .return_values(ReturnValue::AllNew);

        let mut sets = Vec::with_capacity(changes.set.len());
        for (i, (field, value)) in changes.set.into_iter().enumerate() {
            let name = format!("#f{i}");
            let placeholder = format!(":v{i}");
            sets.push(format!("{name} = {placeholder}"));
            request = request
                .expression_attribute_names(name, field)
                .expression_attribute_values(placeholder, value);
        }

        let mut removes = Vec::with_capacity(changes.remove.len());
        for (i, field) in changes.remove.into_iter().enumerate() {
            let name = format!("#r{i}");
            removes.push(name.clone());
            request = request.expression_attribute_names(name, field);
        }

        let mut expression = format!("SET {}", sets.join(", "));
        if !removes.is_empty() {
            expression.push_str(&format!(" REMOVE {}", removes.join(", ")));
        }

        let output = request
            .update_expression(expression)
            .send()
            .await
            .map_err(|err| {
                let missing = err
                    .as_service_error()
                    .is_some_and(|e| e.is_conditional_check_failed_exception());
                if missing {
                    Error::not_found(MEDICATION)
                } else {
                    sdk_error(err)
                }
            })?;

        let item = output
            .attributes
            .ok_or_else(|| Error::storage("update returned no attributes"))?;
        from_item(item)
    }
}

#[async_trait]
impl MedicationStore for DynamoStore {
    async fn insert(&self, medication: Medication) -> Result<Medication, Error> {
        self.client
            .put_item()
            .table_name(&self.medications_table)
            .set_item(Some(to_item(&medication)?))
            .condition_expression("attribute_not_exists(#id)")
            .expression_attribute_names("#id", ID_KEY)
            .send()
            .await
            .map_err(sdk_error)?;

        tracing::info!("Stored medication {}", medication.id);
        Ok(medication)
    }

    async fn list(&self, user_id: &str) -> Result<Vec<Medication>, Error> {
        let query = self
            .user_query(&self.medications_table, user_id)
            .key_condition_expression("#uid = :uid");
        from_items(collect_pages(query).await?)
    }

    async fn list_active(&self, user_id: &str) -> Result<Vec<Medication>, Error> {
        let query = self
            .user_query(&self.medications_table, user_id)
            .key_condition_expression("#uid = :uid")
            .filter_expression("#state = :active")
            .expression_attribute_names("#state", "state")
            .expression_attribute_values(":active", to_value(&MedicationState::Active)?);
        from_items(collect_pages(query).await?)
    }

    async fn get(&self, user_id: &str, id: &str) -> Result<Option<Medication>, Error> {
        let output = self
            .client
            .get_item()
            .table_name(&self.medications_table)
            .key(USER_KEY, AttributeValue::S(user_id.to_string()))
            .key(ID_KEY, AttributeValue::S(id.to_string()))
            .send()
            .await
            .map_err(sdk_error)?;

        output.item.map(from_item).transpose()
    }

    async fn update(
        &self,
        user_id: &str,
        id: &str,
        patch: &MedicationPatch,
    ) -> Result<Medication, Error> {
        let changes = patch_fields(patch, Utc::now())?;
        self.conditional_update(user_id, id, changes).await
    }

    async fn deactivate(&self, user_id: &str, id: &str) -> Result<Medication, Error> {
        let changes = UpdateFields {
            set: vec![
                ("state", to_value(&MedicationState::Inactive)?),
                ("updatedAt", to_value(&Utc::now())?),
            ],
            remove: Vec::new(),
        };
        self.conditional_update(user_id, id, changes).await
    }
}

#[async_trait]
impl AdherenceLogStore for DynamoStore {
    async fn insert(&self, log: AdherenceLog) -> Result<AdherenceLog, Error> {
        let mut item = to_item(&log)?;
        item.insert(
            SCHEDULED_KEY.to_string(),
            AttributeValue::S(scheduled_key(&log.scheduled_time, &log.id)),
        );

        self.client
            .put_item()
            .table_name(&self.logs_table)
            .set_item(Some(item))
            .send()
            .await
            .map_err(sdk_error)?;

        tracing::info!("Stored adherence log {} ({:?})", log.id, log.status);
        Ok(log)
    }

    async fn list(
        &self,
        user_id: &str,
        range: Option<&DateRange>,
    ) -> Result<Vec<AdherenceLog>, Error> {
        let query = self.user_query(&self.logs_table, user_id);
        let query = match range {
            None => query.key_condition_expression("#uid = :uid"),
            Some(range) => {
                let (from, to) = key_bounds(range);
                query
                    .key_condition_expression("#uid = :uid AND #sk BETWEEN :from AND :to")
                    .expression_attribute_names("#sk", SCHEDULED_KEY)
                    .expression_attribute_values(":from", AttributeValue::S(from))
                    .expression_attribute_values(":to", AttributeValue::S(to))
            }
        };
        from_items(collect_pages(query).await?)
    }

    async fn recent(&self, user_id: &str, limit: usize) -> Result<Vec<AdherenceLog>, Error> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let output = self
            .user_query(&self.logs_table, user_id)
            .key_condition_expression("#uid = :uid")
            .scan_index_forward(false)
            .limit(i32::try_from(limit).unwrap_or(i32::MAX))
            .send()
            .await
            .map_err(sdk_error)?;

        from_items(output.items.unwrap_or_default())
    }
}

async fn collect_pages(query: QueryFluentBuilder) -> Result<Vec<Item>, Error> {
    let mut items = Vec::new();
    let mut start_key = None;
    loop {
        let output = query
            .clone()
            .set_exclusive_start_key(start_key)
            .send()
            .await
            .map_err(sdk_error)?;

        items.extend(output.items.unwrap_or_default());
        match output.last_evaluated_key {
            Some(key) if !key.is_empty() => start_key = Some(key),
            _ => return Ok(items),
        }
    }
}

fn scheduled_stamp(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

fn scheduled_key(at: &DateTime<Utc>, id: &str) -> String {
    format!("{}#{}", scheduled_stamp(at), id)
}

/// Sort-key bounds covering every log scheduled within `range`. `~` sorts
/// after every ULID character.
fn key_bounds(range: &DateRange) -> (String, String) {
    (
        scheduled_stamp(&range.start),
        format!("{}#~", scheduled_stamp(&range.end)),
    )
}

/// Attributes to overwrite and attributes to drop in one update.
#[derive(Debug, Default)]
struct UpdateFields {
    set: Vec<(&'static str, AttributeValue)>,
    remove: Vec<&'static str>,
}

impl UpdateFields {
    fn assign<T: Serialize + ?Sized>(&mut self, field: &'static str, value: &T) -> Result<(), Error> {
        self.set.push((field, to_value(value)?));
        Ok(())
    }

    /// `Some(None)` clears the attribute.
    fn set_or_remove<T: Serialize>(
        &mut self,
        field: &'static str,
        value: &Option<Option<T>>,
    ) -> Result<(), Error> {
        match value {
            Some(Some(value)) => self.assign(field, value),
            Some(None) => {
                self.remove.push(field);
                Ok(())
            }
            None => Ok(()),
        }
    }
}

fn patch_fields(patch: &MedicationPatch, at: DateTime<Utc>) -> Result<UpdateFields, Error> {
    let mut fields = UpdateFields::default();
    if let Some(name) = &patch.name {
        fields.assign("name", name.trim())?;
    }
    if let Some(dosage) = &patch.dosage {
        fields.assign("dosage", dosage.trim())?;
    }
    if let Some(frequency) = &patch.frequency {
        fields.assign("frequency", frequency)?;
    }
    if let Some(times) = &patch.times {
        fields.assign("times", times)?;
    }
    if let Some(start_date) = &patch.start_date {
        fields.assign("startDate", start_date)?;
    }
    fields.set_or_remove("endDate", &patch.end_date)?;
    fields.set_or_remove("notes", &patch.notes)?;
    fields.assign("updatedAt", &at)?;
    Ok(fields)
}

fn sdk_error<E: std::error::Error>(err: E) -> Error {
    Error::storage(DisplayErrorContext(err))
}

fn to_item<T: Serialize>(value: &T) -> Result<Item, Error> {
    serde_dynamo::to_item(value).map_err(Error::storage)
}

fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<AttributeValue, Error> {
    serde_dynamo::to_attribute_value(value).map_err(Error::storage)
}

fn from_item<T: DeserializeOwned>(item: Item) -> Result<T, Error> {
    serde_dynamo::from_item(item).map_err(Error::storage)
}

fn from_items<T: DeserializeOwned>(items: Vec<Item>) -> Result<Vec<T>, Error> {
    items.into_iter().map(from_item).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn scheduled_keys_sort_chronologically() {
        let at = Utc.with_ymd_and_hms(2024, 1, 9, 8, 0, 0).unwrap();
        let earlier = scheduled_key(&at, "01HZZZZZZZZZZZZZZZZZZZZZZZ");
        let later = scheduled_key(&(at + Duration::milliseconds(1)), "01H00000000000000000000000");

        assert_eq!(earlier, "2024-01-09T08:00:00.000Z#01HZZZZZZZZZZZZZZZZZZZZZZZ");
        assert!(earlier < later);
    }

    #[test]
    fn key_bounds_include_both_ends() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
        let (from, to) = key_bounds(&DateRange::new(start, end));

        let first = scheduled_key(&start, "01HABCDEFGHJKMNPQRSTVWXYZ0");
        let last = scheduled_key(&end, "01HZZZZZZZZZZZZZZZZZZZZZZZ");
        let after = scheduled_key(&(end + Duration::milliseconds(1)), "01H00000000000000000000000");

        assert!(from <= first && first <= to);
        assert!(from <= last && last <= to);
        assert!(after > to);
    }

    #[test]
    fn patch_sets_only_present_fields() {
        let patch = MedicationPatch {
            dosage: Some(" 10mg ".to_string()),
            times: Some(vec!["07:30".to_string()]),
            ..Default::default()
        };

        let changes = patch_fields(&patch, Utc::now()).unwrap();

        let fields: Vec<_> = changes.set.iter().map(|(field, _)| *field).collect();
        assert_eq!(fields, vec!["dosage", "times", "updatedAt"]);
        assert_eq!(changes.set[0].1, AttributeValue::S("10mg".to_string()));
        assert_eq!(
            changes.set[1].1,
            AttributeValue::L(vec![AttributeValue::S("07:30".to_string())])
        );
        assert!(changes.remove.is_empty());
    }

    #[test]
    fn explicit_null_removes_end_date_and_notes() {
        let patch = MedicationPatch {
            end_date: Some(None),
            notes: Some(None),
            ..Default::default()
        };

        let changes = patch_fields(&patch, Utc::now()).unwrap();

        assert_eq!(changes.remove, vec!["endDate", "notes"]);
        let fields: Vec<_> = changes.set.iter().map(|(field, _)| *field).collect();
        assert_eq!(fields, vec!["updatedAt"]);

        let patch = MedicationPatch {
            notes: Some(Some("after meals".to_string())),
            ..Default::default()
        };
        let changes = patch_fields(&patch, Utc::now()).unwrap();
        assert_eq!(changes.set[0], ("notes", AttributeValue::S("after meals".to_string())));
        assert!(changes.remove.is_empty());
    }

    #[test]
    fn medication_items_use_wire_names() {
        let medication = Medication {
            id: "01HMED".to_string(),
            user_id: "alice".to_string(),
            name: "Aspirin".to_string(),
            dosage: "81mg".to_string(),
            frequency: crate::medications::Frequency::Daily,
            times: vec!["09:00".to_string()],
            start_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            end_date: None,
            notes: None,
            state: MedicationState::Active,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        };

        let item = to_item(&medication).unwrap();
        assert_eq!(item.get(USER_KEY), Some(&AttributeValue::S("alice".to_string())));
        assert_eq!(item.get("state"), Some(&AttributeValue::S("active".to_string())));

        let back: Medication = from_item(item).unwrap();
        assert_eq!(back, medication);
    }
}
