//! SpiceDB schema for Tessera resources

/// Resource paths are `file` objects. The relations mirror the grants the
/// permission resolver understands; `owner_of` is written by provisioning.
pub const TESSERA_SCHEMA: &str = r#"
use expiration

definition user {}

definition agent {}

definition tenant {
    relation member: user | agent
}

definition file {
    relation direct_owner: user | agent | tenant#member
    relation parent_owner: user | agent | tenant#member
    relation owner_of: user | agent | tenant
    relation direct_editor: user | agent | tenant#member | user with expiration | agent with expiration
    relation parent_editor: user | agent | tenant#member
    relation direct_viewer: user | agent | tenant#member | user with expiration | agent with expiration
    relation parent_viewer: user | agent | tenant#member

    permission own = direct_owner + parent_owner + owner_of
    permission edit = own + direct_editor + parent_editor
    permission view = edit + direct_viewer + parent_viewer
}
"#;
