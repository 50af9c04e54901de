extern crate proc_macro;

use itertools::izip;
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use std::collections::HashMap;
use syn::ext::IdentExt;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, Ident};

/// Field attributes parsed from `#[bencode(...)]` annotations
///
/// * `tag` - The dict key this field maps to. Fields without one are invisible to the codec.
/// * `required` - Whether decoding fails when the key is absent
#[derive(Debug, Clone, Default)]
struct FieldAttributes {
    tag: Option<String>,
    required: bool,
}

/// A struct field that carries a tag.
struct TaggedField<'a> {
    ident: &'a Ident,
    tag: String,
    required: bool,
}

/// Extract and parse `#[bencode(...)]` attribute values from field attributes
///
/// # Supported Attributes
///
/// * `#[bencode(tag = "name")]` - Dict key for this field
/// * `#[bencode(required)]` - Fail decoding if the key is missing (needs a tag)
///
/// Multiple attributes can be combined: `#[bencode(tag = "length", required)]`
fn get_field_attributes(attrs: &[Attribute]) -> syn::Result<FieldAttributes> {
    let mut parsed = FieldAttributes::default();
    for attr in attrs {
        if !attr.path().is_ident("bencode") {
            continue;
        }
        attr.parse_args_with(|input: syn::parse::ParseStream| {
            while !input.is_empty() {
                let ident = input.parse::<syn::Ident>()?;

                if ident == "tag" {
                    input.parse::<syn::Token![=]>()?;
                    let lit_str = input.parse::<syn::LitStr>()?;
                    if parsed.tag.is_some() {
                        return Err(syn::Error::new(lit_str.span(), "Tag is specified twice"));
                    }
                    parsed.tag = Some(lit_str.value());
                } else if ident == "required" {
                    parsed.required = true;
                } else {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("Unknown attribute: {}", ident),
                    ));
                }

                // Consume comma if present, otherwise end
                if input.peek(syn::Token![,]) {
                    input.parse::<syn::Token![,]>()?;
                }
            }
            Ok(())
        })?;
    }
    Ok(parsed)
}

/// Collect the tagged fields of a named struct, plus every field identifier.
///
/// Rejects anything other than a struct with named fields, `required` without a tag, and
/// tags used by more than one field.
fn collect_fields(input: &DeriveInput) -> syn::Result<(Vec<TaggedField<'_>>, Vec<&Ident>)> {
    let named = match &input.data {
        Data::Struct(s) => match &s.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "Only structs with named fields can be bencode records",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Only structs with named fields can be bencode records",
            ))
        }
    };

    let mut tagged = Vec::new();
    let mut all_idents = Vec::new();
    let mut used_tags: HashMap<String, &Ident> = HashMap::new();
    for f in named {
        let Some(ident) = f.ident.as_ref() else {
            continue;
        };
        all_idents.push(ident);

        let attrs = get_field_attributes(&f.attrs)?;
        let Some(tag) = attrs.tag else {
            if attrs.required {
                return Err(syn::Error::new_spanned(
                    ident,
                    "`required` needs a `tag` on the same field",
                ));
            }
            continue;
        };
        if let Some(first) = used_tags.insert(tag.clone(), ident) {
            return Err(syn::Error::new_spanned(
                ident,
                format!(
                    "Tag \"{}\" is duplicated for struct '{}': used by '{}' and '{}'",
                    tag, input.ident, first, ident
                ),
            ));
        }
        tagged.push(TaggedField {
            ident,
            tag,
            required: attrs.required,
        });
    }
    Ok((tagged, all_idents))
}

/// The static field table shared by both derives.
fn field_table(fields: &[TaggedField<'_>]) -> TokenStream2 {
    let entries = fields.iter().map(|f| {
        let tag = &f.tag;
        let name = f.ident.unraw().to_string();
        let required = f.required;
        quote! {
            bencode_typed::Field { tag: #tag, name: #name, required: #required }
        }
    });
    quote! { &[#(#entries),*] }
}

/// Derive macro for implementing the `Encoder` trait on a tagged record
///
/// Generates `EncodeRecord` (the field table and slot accessor) and an `Encoder` impl that
/// writes the struct as a dict with keys in ascending byte order.
///
/// # Examples
///
/// ```ignore
/// #[derive(Encode)]
/// struct Info {
///     #[bencode(tag = "name")]
///     name: String,
///     #[bencode(tag = "piece length")]
///     piece_length: i64,
///     cached_hash: Option<String>, // no tag: never encoded
/// }
/// ```
#[proc_macro_derive(Encode, attributes(bencode))]
pub fn derive_encode(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_encode(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_encode(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let name_str = name.unraw().to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let (fields, _) = collect_fields(input)?;

    let table = field_table(&fields);
    let slot_arms = izip!(0usize.., &fields).map(|(index, f)| {
        let ident = f.ident;
        quote! {
            #index => ::core::option::Option::Some(&self.#ident),
        }
    });

    Ok(quote! {
        impl #impl_generics bencode_typed::EncodeRecord for #name #ty_generics #where_clause {
            const NAME: &'static str = #name_str;
            const FIELDS: &'static [bencode_typed::Field] = #table;

            fn field(&self, index: usize) -> ::core::option::Option<&dyn bencode_typed::Encoder> {
                match index {
                    #(#slot_arms)*
                    _ => ::core::option::Option::None,
                }
            }
        }

        impl #impl_generics bencode_typed::Encoder for #name #ty_generics #where_clause {
            fn encode(&self, writer: &mut bencode_typed::BytesMut) -> bencode_typed::Result<()> {
                bencode_typed::encode_record(self, writer)
            }
        }
    })
}

/// Derive macro for implementing the `Decoder` trait on a tagged record
///
/// Generates `DecodeRecord` (the field table and slot writer) and a `Decoder` impl. Keys
/// that match no tag are skipped. `Decoder::decode` starts every field from
/// `Default::default()`, so all field types (tagged or not) must implement `Default`;
/// `Decoder::decode_into` assigns only the fields present in the input.
///
/// # Examples
///
/// ```ignore
/// #[derive(Decode)]
/// struct Info {
///     #[bencode(tag = "name", required)]
///     name: String,
///     #[bencode(tag = "length")]
///     length: i64,
/// }
/// ```
#[proc_macro_derive(Decode, attributes(bencode))]
pub fn derive_decode(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_decode(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_decode(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let name_str = name.unraw().to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let (fields, all_idents) = collect_fields(input)?;

    let table = field_table(&fields);
    let slot_arms = izip!(0usize.., &fields).map(|(index, f)| {
        let ident = f.ident;
        quote! {
            #index => bencode_typed::Decoder::decode_into(&mut self.#ident, reader),
        }
    });

    Ok(quote! {
        impl #impl_generics bencode_typed::DecodeRecord for #name #ty_generics #where_clause {
            const NAME: &'static str = #name_str;
            const FIELDS: &'static [bencode_typed::Field] = #table;

            fn decode_field(
                &mut self,
                index: usize,
                reader: &mut bencode_typed::Reader,
            ) -> bencode_typed::Result<()> {
                match index {
                    #(#slot_arms)*
                    _ => ::core::result::Result::Err(bencode_typed::EncoderError::MissingTag {
                        record: #name_str,
                        index,
                    }),
                }
            }
        }

        impl #impl_generics bencode_typed::Decoder for #name #ty_generics #where_clause {
            fn decode(reader: &mut bencode_typed::Reader) -> bencode_typed::Result<Self> {
                let mut value = Self {
                    #( #all_idents: ::core::default::Default::default(), )*
                };
                bencode_typed::decode_record(&mut value, reader)?;
                ::core::result::Result::Ok(value)
            }

            fn decode_into(&mut self, reader: &mut bencode_typed::Reader) -> bencode_typed::Result<()> {
                bencode_typed::decode_record(self, reader)
            }
        }
    })
}
