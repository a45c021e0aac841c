//! Device type catalogue handlers.

use tabled::Tabled;

use ptit_core::{DeviceType, DeviceTypePatch, NewDeviceType};

use crate::cli::{DeviceTypeFields, DeviceTypesArgs, DeviceTypesCommand, GlobalOpts};
use crate::config::Connection;
use crate::error::CliError;

use super::util;

#[derive(Tabled)]
struct DeviceTypeRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Manufacturer")]
    manufacturer: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&DeviceType> for DeviceTypeRow {
    fn from(t: &DeviceType) -> Self {
        Self {
            id: t.id.to_string(),
            name: t.name.clone(),
            category: util::or_dash(t.category.as_deref()),
            manufacturer: util::or_dash(t.manufacturer.as_deref()),
            description: util::or_dash(t.description.as_deref()),
        }
    }
}

fn detail(t: &DeviceType) -> String {
    [
        format!("ID:           {}", t.id),
        format!("Name:         {}", t.name),
        format!("Category:     {}", util::or_dash(t.category.as_deref())),
        format!("Manufacturer: {}", util::or_dash(t.manufacturer.as_deref())),
        format!("Description:  {}", util::or_dash(t.description.as_deref())),
    ]
    .join("\n")
}

fn draft(fields: DeviceTypeFields) -> Result<NewDeviceType, CliError> {
    if let Some(path) = &fields.from_file {
        return util::read_json_file(path);
    }
    Ok(NewDeviceType {
        name: fields.name.unwrap_or_default(),
        description: fields.description,
        manufacturer: fields.manufacturer,
        category: fields.category,
    })
}

fn patch(fields: DeviceTypeFields) -> Result<DeviceTypePatch, CliError> {
    if let Some(path) = &fields.from_file {
        return util::read_json_file(path);
    }
    Ok(DeviceTypePatch {
        name: fields.name,
        description: fields.description,
        manufacturer: fields.manufacturer,
        category: fields.category,
    })
}

pub async fn handle(
    conn: &Connection,
    args: DeviceTypesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        DeviceTypesCommand::List(list) => {
            util::list::<DeviceType, _>(conn, &list, global, |t| DeviceTypeRow::from(t.as_ref()))
                .await
        }
        DeviceTypesCommand::Get { id } => util::get::<DeviceType>(conn, &id, global, detail).await,
        DeviceTypesCommand::Create(fields) => {
            util::create::<DeviceType>(conn, &draft(fields)?, global, detail).await
        }
        DeviceTypesCommand::Update { id, fields } => {
            util::update::<DeviceType>(conn, &id, &patch(fields)?, global, detail).await
        }
        DeviceTypesCommand::Delete { id } => util::delete::<DeviceType>(conn, &id, global).await,
    }
}
