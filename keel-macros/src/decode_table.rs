use crate::decode_column::{ColumnMetadata, decode_column};
use convert_case::{Case, Casing};
use quote::ToTokens;
use syn::{Expr, ExprLit, ExprParen, ExprPath, ItemStruct, Lit, LitStr, parse::ParseBuffer};

pub(crate) struct TableMetadata {
    pub(crate) columns: Vec<ColumnMetadata>,
    pub(crate) name: String,
    pub(crate) kind: String,
    pub(crate) partition: Vec<String>,
    pub(crate) clustering: Vec<String>,
    pub(crate) global_indexes: Vec<Vec<String>>,
}

/// Storage name of a column referenced either by its name as a string literal or by its field.
fn decode_column_ref(columns: &[ColumnMetadata], expr: &Expr) -> Result<String, String> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Str(v), ..
        }) => {
            let v = v.value();
            columns
                .iter()
                .find(|c| c.name == v)
                .map(|c| c.name.clone())
                .ok_or_else(|| format!("Column `{}` does not exist in the entity", v))
        }
        Expr::Path(ExprPath { path, .. }) => {
            let Some(ident) = path.get_ident() else {
                return Err(format!(
                    "Expected a field name, found `{}`",
                    path.to_token_stream()
                ));
            };
            columns
                .iter()
                .find(|c| c.ident == *ident || c.name == ident.to_string())
                .map(|c| c.name.clone())
                .ok_or_else(|| format!("Field `{}` does not exist in the entity", ident))
        }
        Expr::Paren(ExprParen { expr, .. }) => decode_column_ref(columns, expr),
        _ => Err(format!(
            "Expected a column, found `{}`",
            expr.to_token_stream()
        )),
    }
}

/// Flat list of columns out of `a`, `(a)` or `(a, b, ..)`.
fn decode_column_list(columns: &[ColumnMetadata], expr: &Expr) -> Result<Vec<String>, String> {
    match expr {
        Expr::Tuple(tuple) => tuple
            .elems
            .iter()
            .map(|v| decode_column_ref(columns, v))
            .collect(),
        v => Ok(vec![decode_column_ref(columns, v)?]),
    }
}

/// Partition and clustering columns: the first element is the partition group, the rest are clustering columns.
fn decode_primary_key(
    columns: &[ColumnMetadata],
    expr: &Expr,
) -> Result<(Vec<String>, Vec<String>), String> {
    match expr {
        Expr::Tuple(tuple) => {
            let mut elems = tuple.elems.iter();
            let Some(first) = elems.next() else {
                return Err("The primary key cannot be empty".into());
            };
            let partition = match first {
                Expr::Paren(ExprParen { expr, .. }) => decode_column_list(columns, expr)?,
                v => decode_column_list(columns, v)?,
            };
            let clustering = elems
                .map(|v| decode_column_ref(columns, v))
                .collect::<Result<_, _>>()?;
            Ok((partition, clustering))
        }
        Expr::Paren(ExprParen { expr, .. }) => decode_primary_key(columns, expr),
        v => Ok((vec![decode_column_ref(columns, v)?], vec![])),
    }
}

pub fn decode_table(item: &ItemStruct) -> TableMetadata {
    let columns: Vec<_> = item.fields.iter().filter_map(decode_column).collect();
    let mut name = item.ident.to_string().to_case(Case::Snake);
    let mut kind = item.ident.to_string();
    let mut primary_key = None;
    let mut global_indexes = vec![];
    if name.starts_with('_') {
        name.remove(0);
    }
    for attr in &item.attrs {
        let meta = &attr.meta;
        if meta.path().is_ident("keel") {
            let Ok(list) = meta.require_list() else {
                panic!("Error while parsing `keel`, use it like: `#[keel(attribute = value, ..)]`",);
            };
            let _ = list.parse_nested_meta(|arg| {
                if arg.path.is_ident("name") {
                    let Ok(value) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                        panic!("Error while parsing `name`, use it like: `#[keel(name = \"my_table\")]`");
                    };
                    name = value.value();
                } else if arg.path.is_ident("kind") {
                    let Ok(value) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                        panic!("Error while parsing `kind`, use it like: `#[keel(kind = \"my_entity\")]`");
                    };
                    kind = value.value();
                } else if arg.path.is_ident("primary_key") {
                    let Ok(value) = arg.value().and_then(ParseBuffer::parse::<Expr>) else {
                        panic!("Error while parsing `primary_key`, use it like: `#[keel(primary_key = ((partition, ..), clustering, ..))]`");
                    };
                    if primary_key.is_some() {
                        panic!("Primary key attribute can appear just once on an entity");
                    }
                    primary_key = Some(
                        decode_primary_key(&columns, &value)
                            .unwrap_or_else(|e| panic!("Error while parsing `primary_key`: {e}")),
                    );
                } else if arg.path.is_ident("global_index") {
                    let Ok(value) = arg.value().and_then(ParseBuffer::parse::<Expr>) else {
                        panic!("Error while parsing `global_index`, use it like: `#[keel(global_index = (c1, c2, ..))]`, you can specify more than one");
                    };
                    global_indexes.push(
                        decode_column_list(&columns, &value)
                            .unwrap_or_else(|e| panic!("Error while parsing `global_index`: {e}")),
                    );
                } else {
                    panic!(
                        "Unknown attribute `{}` inside keel macro",
                        arg.path.to_token_stream().to_string()
                    );
                }
                Ok(())
            });
        }
    }
    let Some((partition, clustering)) = primary_key else {
        panic!(
            "Entity `{}` must declare a primary key, use it like: `#[keel(primary_key = (id))]`",
            item.ident
        );
    };
    TableMetadata {
        columns,
        name,
        kind,
        partition,
        clustering,
        global_indexes,
    }
}
