use keel_core::{ColumnType, Generator, Order, option_inner};
use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use syn::{Expr, Field, Ident, LitStr, parse::ParseBuffer};

pub(crate) struct ColumnMetadata {
    pub(crate) ident: Ident,
    pub(crate) name: String,
    pub(crate) column_type: ColumnType,
    pub(crate) optional: bool,
    pub(crate) generator: Option<Generator>,
    pub(crate) on_upsert: Option<Expr>,
    pub(crate) order: Order,
}

impl ColumnMetadata {
    /// `::keel::ColumnDef` literal usable in a static.
    pub(crate) fn column_def(&self) -> TokenStream {
        let name = &self.name;
        let field = self.ident.to_string();
        let column_type = &self.column_type;
        let generator = match &self.generator {
            Some(v) => quote!(Some(#v)),
            None => quote!(None),
        };
        let on_upsert = match &self.on_upsert {
            Some(v) => quote!(Some(#v as fn(::keel::Value) -> ::keel::Value)),
            None => quote!(None),
        };
        let order = &self.order;
        quote! {
            ::keel::ColumnDef {
                name: #name,
                field: #field,
                column_type: #column_type,
                options: ::keel::ColumnOptions {
                    generator: #generator,
                    on_upsert: #on_upsert,
                    order: #order,
                },
            }
        }
    }

    /// Expression of type `Option<::keel::Value>` reading the field.
    pub(crate) fn getter(&self) -> TokenStream {
        let ident = &self.ident;
        match (self.column_type.is_json(), self.optional) {
            (true, true) => quote!(self.#ident.as_ref().map(|v| ::keel::json_to_value(v))),
            (true, false) => quote!(Some(::keel::json_to_value(&self.#ident))),
            (false, true) => quote!(self.#ident.clone().map(::keel::AsValue::as_value)),
            (false, false) => quote!(Some(::keel::AsValue::as_value(self.#ident.clone()))),
        }
    }

    /// Statements assigning `value` to the field, a null leaves required fields untouched.
    pub(crate) fn setter(&self) -> TokenStream {
        let ident = &self.ident;
        let context = format!("While setting the field `{}`", ident);
        let context = quote!(.map_err(|e| e.context(#context))?);
        match (self.column_type.is_json(), self.optional) {
            (true, true) => quote! {
                self.#ident = if value.is_null() {
                    None
                } else {
                    Some(::keel::json_from_value(value)#context)
                };
            },
            (true, false) => quote! {
                if !value.is_null() {
                    self.#ident = ::keel::json_from_value(value)#context;
                }
            },
            (false, true) => quote! {
                self.#ident = ::keel::AsValue::try_from_value(value)#context;
            },
            (false, false) => quote! {
                if !value.is_null() {
                    self.#ident = ::keel::AsValue::try_from_value(value)#context;
                }
            },
        }
    }
}

/// Column metadata of a field, `None` for fields marked `#[keel(ignore)]`.
pub fn decode_column(field: &Field) -> Option<ColumnMetadata> {
    let ident = field
        .ident
        .clone()
        .expect("Field is expected to have a name");
    let mut name = ident.to_string();
    if name.starts_with('_') {
        name.remove(0);
    }
    let mut column_type = None;
    let mut generator = None;
    let mut on_upsert = None;
    let mut order = Order::default();
    let mut ignore = false;
    for attr in &field.attrs {
        let meta = &attr.meta;
        if meta.path().is_ident("keel") {
            let Ok(list) = meta.require_list() else {
                panic!("Error while parsing `keel`, use it like: `#[keel(attribute = value, ...)]`");
            };
            let _ = list.parse_nested_meta(|arg| {
                if arg.path.is_ident("name") {
                    let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                        panic!("Error while parsing `name`, use it like: `#[keel(name = \"my_column\")]`");
                    };
                    name = v.value();
                } else if arg.path.is_ident("type") {
                    let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                        panic!("Error while parsing `type`, use it like: `#[keel(type = \"encoded_json\")]`");
                    };
                    column_type = Some(v.value().parse::<ColumnType>().unwrap_or_else(|e| {
                        panic!("{e}, expected one of: {}", ColumnType::ALL.map(|v| v.as_str()).join(", "))
                    }));
                } else if arg.path.is_ident("generator") {
                    let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                        panic!("Error while parsing `generator`, use it like: `#[keel(generator = \"uuid\")]`");
                    };
                    generator = Some(v.value().parse::<Generator>().unwrap_or_else(|e| panic!("{e}")));
                } else if arg.path.is_ident("order") {
                    let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                        panic!("Error while parsing `order`, use it like: `#[keel(order = \"DESC\")]`");
                    };
                    order = v.value().parse::<Order>().unwrap_or_else(|e| panic!("{e}"));
                } else if arg.path.is_ident("on_upsert") {
                    let Ok(v) = arg.value().and_then(ParseBuffer::parse::<Expr>) else {
                        panic!("Error while parsing `on_upsert`, use it like: `#[keel(on_upsert = path::to::function)]`");
                    };
                    on_upsert = Some(v);
                } else if arg.path.is_ident("ignore") {
                    let Err(..) = arg.value() else {
                        // value() is Err for Meta::Path
                        panic!("Error while parsing `ignore`, use it like: `#[keel(ignore)]`");
                    };
                    ignore = true;
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
    if ignore {
        return None;
    }
    let column_type = column_type
        .or_else(|| ColumnType::from_rust_type(&field.ty))
        .unwrap_or_else(|| {
            panic!(
                "Cannot infer the column type of `{}`, declare it like: `#[keel(type = \"json\")]`",
                ident
            )
        });
    Some(ColumnMetadata {
        optional: option_inner(&field.ty).is_some(),
        ident,
        name,
        column_type,
        generator,
        on_upsert,
        order,
    })
}
