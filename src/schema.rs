// Hand-maintained in the style of a `diesel print-schema` output. Kept in one
// file, like the reference tool's generated schema, so every table definition
// used by diesel's query DSL lives in one place.

diesel::table! {
    taxonomies (id) {
        id -> Uuid,
        owner_id -> Text,
        kind -> Text,
        status -> Text,
        current_version -> Int4,
        last_load_id -> Nullable<Uuid>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    node_types (id) {
        id -> Int4,
        name -> Text,
        status -> Text,
    }
}

diesel::table! {
    attribute_types (id) {
        id -> Int4,
        name -> Text,
        status -> Text,
    }
}

diesel::table! {
    // Unique index on (taxonomy_id, node_type_id, customer_id, parent_id,
    // folded_value) backs the natural key (§3/§8); `folded_value` is the
    // stored `lower(value)` the conflict target actually uses, since
    // Postgres can't target a bare expression index through diesel's
    // `on_conflict` DSL.
    nodes (id) {
        id -> Uuid,
        taxonomy_id -> Uuid,
        node_type_id -> Int4,
        customer_id -> Text,
        parent_id -> Nullable<Uuid>,
        value -> Text,
        folded_value -> Text,
        profession -> Nullable<Text>,
        level -> Int4,
        status -> Text,
        load_id -> Uuid,
        row_id -> Uuid,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    node_attributes (id) {
        id -> Uuid,
        node_id -> Uuid,
        attribute_type_id -> Int4,
        value -> Text,
        status -> Text,
        load_id -> Uuid,
        row_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    loads (id) {
        id -> Uuid,
        owner_id -> Text,
        taxonomy_id -> Uuid,
        kind -> Text,
        taxonomy_kind -> Text,
        status -> Text,
        active -> Bool,
        started_at -> Timestamptz,
        ended_at -> Nullable<Timestamptz>,
        details -> Jsonb,
    }
}

diesel::table! {
    bronze_rows (id) {
        id -> Uuid,
        load_id -> Uuid,
        owner_id -> Text,
        taxonomy_id -> Uuid,
        row_index -> Int4,
        payload -> Jsonb,
        status -> Text,
        active -> Bool,
    }
}

diesel::table! {
    taxonomy_versions (id) {
        id -> Uuid,
        taxonomy_id -> Uuid,
        version_number -> Int4,
        change_type -> Text,
        affected_nodes -> Jsonb,
        affected_attributes -> Jsonb,
        remapping_flag -> Bool,
        remapping_reason -> Nullable<Text>,
        remapping_processed -> Int4,
        remapping_changed -> Int4,
        remapping_unchanged -> Int4,
        remapping_failed -> Int4,
        remapping_new -> Int4,
        remapping_status -> Text,
        version_from_date -> Timestamptz,
        version_to_date -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    mapping_rules (id) {
        id -> Uuid,
        name -> Text,
        command -> Text,
        pattern -> Nullable<Text>,
        attribute_filters -> Jsonb,
        flags -> Jsonb,
        ai_flag -> Bool,
        human_flag -> Bool,
        enabled -> Bool,
    }
}

diesel::table! {
    mapping_rule_assignments (id) {
        id -> Uuid,
        rule_id -> Uuid,
        master_node_type_id -> Int4,
        child_node_type_id -> Int4,
        priority -> Int4,
    }
}

diesel::table! {
    mappings (id) {
        id -> Uuid,
        rule_id -> Nullable<Uuid>,
        master_node_id -> Uuid,
        child_node_id -> Uuid,
        confidence -> Int4,
        status -> Text,
        user_attribution -> Nullable<Text>,
        mapping_version -> Int4,
        supersedes -> Nullable<Uuid>,
        is_active -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    mapping_versions (id) {
        id -> Uuid,
        mapping_id -> Uuid,
        version_number -> Int4,
        superseded_by -> Nullable<Uuid>,
        version_from_date -> Timestamptz,
        version_to_date -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    production_mappings (id) {
        id -> Uuid,
        master_node_id -> Uuid,
        child_node_id -> Uuid,
        confidence -> Int4,
        synced_at -> Timestamptz,
    }
}

diesel::table! {
    audit_logs (id) {
        id -> Uuid,
        entity_table -> Text,
        entity_id -> Uuid,
        operation -> Text,
        old_row -> Nullable<Jsonb>,
        new_row -> Nullable<Jsonb>,
        actor -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    matcher_invocations (id) {
        id -> Uuid,
        child_node_id -> Uuid,
        request_hash -> Text,
        confidence -> Nullable<Int4>,
        accepted -> Bool,
        reasoning -> Nullable<Text>,
        error -> Nullable<Text>,
        latency_ms -> Int4,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(nodes -> taxonomies (taxonomy_id));
diesel::joinable!(nodes -> node_types (node_type_id));
diesel::joinable!(node_attributes -> nodes (node_id));
diesel::joinable!(node_attributes -> attribute_types (attribute_type_id));
diesel::joinable!(bronze_rows -> loads (load_id));
diesel::joinable!(taxonomy_versions -> taxonomies (taxonomy_id));
diesel::joinable!(mapping_rule_assignments -> mapping_rules (rule_id));
diesel::joinable!(mappings -> mapping_rules (rule_id));

diesel::allow_tables_to_appear_in_same_query!(
    taxonomies,
    node_types,
    attribute_types,
    nodes,
    node_attributes,
    loads,
    bronze_rows,
    taxonomy_versions,
    mapping_rules,
    mapping_rule_assignments,
    mappings,
    mapping_versions,
    production_mappings,
    audit_logs,
    matcher_invocations,
);
