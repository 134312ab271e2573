use crate::dialect::Dialect;
use crate::schema::{Cardinality, EnumType, Index, IntrospectionResult, Relation, Table};

/// Assemble the dialect-independent part of a result from per-table output.
///
/// Tables are ordered by name and relations by (source table, constraint), so
/// the result does not depend on the order tables were fetched in. Relation
/// cardinality is read off the assembled indices: a foreign key whose source
/// columns are exactly a unique or primary-key index is one-to-one.
pub fn assemble(
    dialect: Dialect,
    schema: &str,
    mut tables: Vec<Table>,
    relations: Vec<Relation>,
    enums: Vec<EnumType>,
) -> IntrospectionResult {
    tables.sort_by(|a, b| a.name.cmp(&b.name));

    let mut relations = dedup_relations(relations);
    relations.sort_by(|a, b| {
        a.source_table
            .cmp(&b.source_table)
            .then_with(|| a.name.cmp(&b.name))
    });

    let cardinalities: Vec<Cardinality> = relations
        .iter()
        .map(|relation| resolve_cardinality(relation, &relations, &tables))
        .collect();
    for (relation, cardinality) in relations.iter_mut().zip(cardinalities) {
        relation.cardinality = cardinality;
    }

    IntrospectionResult {
        dialect,
        schema: schema.to_string(),
        tables,
        relations,
        enums,
    }
}

/// Drop repeated column pairs while keeping first-seen order.
fn dedup_relations(relations: Vec<Relation>) -> Vec<Relation> {
    let mut kept: Vec<Relation> = Vec::with_capacity(relations.len());
    for relation in relations {
        if !kept.contains(&relation) {
            kept.push(relation);
        }
    }
    kept
}

fn resolve_cardinality(relation: &Relation, all: &[Relation], tables: &[Table]) -> Cardinality {
    let mut source_columns: Vec<&str> = all
        .iter()
        .filter(|r| r.source_table == relation.source_table && r.name == relation.name)
        .map(|r| r.source_column.as_str())
        .collect();
    source_columns.sort_unstable();

    let covered = tables
        .iter()
        .find(|t| t.name == relation.source_table)
        .map(|t| t.indices.iter().any(|i| covers_exactly(i, &source_columns)))
        .unwrap_or(false);

    if covered {
        Cardinality::OneToOne
    } else {
        Cardinality::ManyToOne
    }
}

fn covers_exactly(index: &Index, sorted_columns: &[&str]) -> bool {
    if !(index.unique || index.is_primary_key) || index.fields.len() != sorted_columns.len() {
        return false;
    }
    let mut fields: Vec<&str> = index.fields.iter().map(String::as_str).collect();
    fields.sort_unstable();
    fields == sorted_columns
}
