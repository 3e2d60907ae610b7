mod decode_column;
mod decode_table;

use decode_table::decode_table;
use proc_macro::TokenStream;
use quote::quote;
use syn::{ItemStruct, parse_macro_input};

/// Implements `keel::Entity` for a struct with named fields.
///
/// ```ignore
/// #[derive(Entity, Default, Clone, PartialEq, Debug)]
/// #[keel(name = "files", primary_key = ((company_id), id), global_index = (company_id, parent_id))]
/// struct File {
///     company_id: Option<Uuid>,
///     #[keel(generator = "uuid")]
///     id: Option<Uuid>,
///     parent_id: Option<Uuid>,
///     #[keel(type = "encoded_json")]
///     tags: Vec<String>,
/// }
/// ```
#[proc_macro_derive(Entity, attributes(keel))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let item: ItemStruct = parse_macro_input!(input as ItemStruct);
    let table = decode_table(&item);
    let name = &item.ident;
    let (impl_generics, ty_generics, where_clause) = item.generics.split_for_impl();
    let table_name = &table.name;
    let kind = &table.kind;
    let partition = &table.partition;
    let clustering = &table.clustering;
    let global_indexes = table.global_indexes.iter().map(|v| quote!(&[#(#v),*]));
    let columns_len = table.columns.len();
    let column_defs = table.columns.iter().map(|c| c.column_def());
    let column_names = table.columns.iter().map(|c| &c.name).collect::<Vec<_>>();
    let getters = table.columns.iter().map(|c| c.getter());
    let setters = table.columns.iter().map(|c| c.setter());
    quote! {
        impl #impl_generics ::keel::Entity for #name #ty_generics #where_clause {
            fn definition() -> &'static ::keel::EntityDef {
                static DEFINITION: ::keel::EntityDef = ::keel::EntityDef {
                    name: #table_name,
                    kind: #kind,
                    primary_key: ::keel::PrimaryKey {
                        partition: &[#(#partition),*],
                        clustering: &[#(#clustering),*],
                    },
                    global_indexes: &[#(#global_indexes),*],
                };
                &DEFINITION
            }

            fn columns() -> &'static [::keel::ColumnDef] {
                static COLUMNS: [::keel::ColumnDef; #columns_len] = [#(#column_defs),*];
                &COLUMNS
            }

            fn get(&self, column: &str) -> Option<::keel::Value> {
                match column {
                    #(#column_names => #getters,)*
                    _ => None,
                }
            }

            fn set(&mut self, column: &str, value: ::keel::Value) -> ::keel::Result<()> {
                match column {
                    #(#column_names => { #setters })*
                    _ => {
                        return Err(::keel::Error::msg(format!(
                            "Column `{}` is not declared by entity `{}`",
                            column,
                            #table_name,
                        )));
                    }
                }
                Ok(())
            }
        }
    }
    .into()
}
