//! Pagepath Derive Macros: Page Objects as Structs
//!
//! Declares a page-object tree with plain Rust structs instead of building
//! `PageNode` maps by hand. Every field is one named member; the field type
//! supplies that member's own children.
//!
//! # Example
//!
//! ```ignore
//! use pagepath::{Leaf, PageObject};
//!
//! #[derive(PageObject)]
//! struct SingleComponent {
//!     #[element(".child-item")]
//!     child_item: Leaf,
//! }
//!
//! #[derive(PageObject)]
//! struct App {
//!     #[element(".single-element")]
//!     single_element: Leaf,
//!     #[collection(".list li")]
//!     list: Leaf,
//!     #[element(".container")]
//!     single_component: SingleComponent,
//!     #[collection("button.sign-in")]
//!     #[page(name = "Sign in Buttons")]
//!     sign_in: Leaf,
//! }
//!
//! engine.register_page::<App>();
//! let item = engine.get_element("Single Component > Child Item").await?;
//! ```
//!
//! # Attributes
//!
//! - `#[element("css")]` - member is a single element
//! - `#[collection("css")]` - member is an ordered collection
//! - `#[page(name = "...")]` - register under this name instead of the
//!   PascalCase form of the field name

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Field, Fields, LitStr, Type};

/// Derive `pagepath::PageObject` for a struct with named fields.
///
/// Each field must carry exactly one of `#[element("css")]` or
/// `#[collection("css")]`. Field names are registered in PascalCase
/// (`single_element` becomes `SingleElement`), which path lookup matches
/// against `Single Element` since names are compared without whitespace.
#[proc_macro_derive(PageObject, attributes(element, collection, page))]
pub fn derive_page_object(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// One declared member of a page object
struct Member {
    name: String,
    selector: LitStr,
    collection: bool,
    ty: Type,
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;
    let members = named_fields(input)?
        .into_iter()
        .map(member)
        .collect::<syn::Result<Vec<_>>>()?;

    let inserts = members.iter().map(|m| {
        let Member {
            name,
            selector,
            collection,
            ty,
        } = m;
        let node = if *collection {
            quote!(::pagepath::PageNode::collection(#selector))
        } else {
            quote!(::pagepath::PageNode::element(#selector))
        };
        quote! {
            let _ = children.insert(
                #name,
                #node.with_children(<#ty as ::pagepath::PageObject>::children()),
            );
        }
    });

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    Ok(quote! {
        impl #impl_generics ::pagepath::PageObject for #ident #ty_generics #where_clause {
            fn children() -> ::pagepath::Children {
                let mut children = ::pagepath::Children::new();
                #(#inserts)*
                children
            }
        }
    })
}

fn named_fields(input: &DeriveInput) -> syn::Result<Vec<&Field>> {
    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => Ok(fields.named.iter().collect()),
            Fields::Unit => Ok(Vec::new()),
            Fields::Unnamed(_) => Err(syn::Error::new_spanned(
                &input.ident,
                "PageObject can only be derived for structs with named fields",
            )),
        },
        _ => Err(syn::Error::new_spanned(
            &input.ident,
            "PageObject can only be derived for structs",
        )),
    }
}

fn member(field: &Field) -> syn::Result<Member> {
    let Some(ident) = &field.ident else {
        return Err(syn::Error::new_spanned(field, "expected a named field"));
    };

    let mut selector: Option<(LitStr, bool)> = None;
    for attr in &field.attrs {
        let collection = if attr.path().is_ident("element") {
            false
        } else if attr.path().is_ident("collection") {
            true
        } else {
            continue;
        };
        if selector.is_some() {
            return Err(syn::Error::new_spanned(
                attr,
                "a member is either #[element] or #[collection], not both",
            ));
        }
        selector = Some((attr.parse_args::<LitStr>()?, collection));
    }

    let Some((selector, collection)) = selector else {
        return Err(syn::Error::new_spanned(
            ident,
            format!("field `{ident}` needs #[element(\"css\")] or #[collection(\"css\")]"),
        ));
    };

    let name = match name_override(&field.attrs)? {
        Some(name) => name,
        None => to_pascal_case(&ident.unraw().to_string()),
    };

    Ok(Member {
        name,
        selector,
        collection,
        ty: field.ty.clone(),
    })
}

/// Read `#[page(name = "...")]`
fn name_override(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut name = None;
    for attr in attrs.iter().filter(|a| a.path().is_ident("page")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                name = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unsupported page attribute, expected `name`"))
            }
        })?;
    }
    Ok(name)
}

/// Convert snake_case to PascalCase
fn to_pascal_case(s: &str) -> String {
    s.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn expand_err(input: DeriveInput) -> String {
        match expand(&input) {
            Ok(tokens) => panic!("expected an error, got {tokens}"),
            Err(err) => err.to_string(),
        }
    }

    #[test]
    fn test_to_pascal_case() {
        assert_eq!(to_pascal_case("list"), "List");
        assert_eq!(to_pascal_case("single_element"), "SingleElement");
        assert_eq!(to_pascal_case("multiple_components"), "MultipleComponents");
        assert_eq!(to_pascal_case("_leading__double_"), "LeadingDouble");
        assert_eq!(to_pascal_case("item2"), "Item2");
    }

    #[test]
    fn test_expands_members() {
        let input: DeriveInput = parse_quote! {
            struct App {
                #[element(".single-element")]
                single_element: Leaf,
                #[collection(".list li")]
                list: Leaf,
            }
        };
        let tokens = expand(&input).unwrap_or_default().to_string();
        assert!(tokens.contains("\"SingleElement\""));
        assert!(tokens.contains("\"List\""));
        assert!(tokens.contains("PageNode :: element (\".single-element\")"));
        assert!(tokens.contains("PageNode :: collection (\".list li\")"));
    }

    #[test]
    fn test_nested_page_object_children() {
        let input: DeriveInput = parse_quote! {
            struct App {
                #[element(".container")]
                single_component: SingleComponent,
                #[collection(".list-components li")]
                multiple_components: MultipleComponent,
            }
        };
        let tokens = expand(&input).unwrap().to_string();
        assert!(tokens.contains("< SingleComponent as :: pagepath :: PageObject > :: children ()"));
        assert!(tokens.contains("< MultipleComponent as :: pagepath :: PageObject > :: children ()"));
        assert!(tokens.contains("\"MultipleComponents\""));
    }

    #[test]
    fn test_name_override() {
        let input: DeriveInput = parse_quote! {
            struct Header {
                #[collection("button.sign-in")]
                #[page(name = "Sign in Buttons")]
                sign_in: Leaf,
            }
        };
        let tokens = expand(&input).unwrap_or_default().to_string();
        assert!(tokens.contains("\"Sign in Buttons\""));
        assert!(!tokens.contains("\"SignIn\""));
    }

    #[test]
    fn test_raw_identifier() {
        let input: DeriveInput = parse_quote! {
            struct Form {
                #[element("input[name=type]")]
                r#type: Leaf,
            }
        };
        let tokens = expand(&input).unwrap_or_default().to_string();
        assert!(tokens.contains("\"Type\""));
    }

    #[test]
    fn test_unit_struct_has_no_children() {
        let input: DeriveInput = parse_quote! { struct Empty; };
        let tokens = expand(&input).unwrap_or_default().to_string();
        assert!(tokens.contains("Children :: new ()"));
        assert!(!tokens.contains("insert"));
    }

    #[test]
    fn test_missing_selector_attribute() {
        let err = expand_err(parse_quote! {
            struct App { list: Leaf }
        });
        assert!(err.contains("`list` needs"));
    }

    #[test]
    fn test_both_kinds_rejected() {
        let err = expand_err(parse_quote! {
            struct App {
                #[element("a")]
                #[collection("b")]
                link: Leaf,
            }
        });
        assert!(err.contains("not both"));
    }

    #[test]
    fn test_unknown_page_key_rejected() {
        let err = expand_err(parse_quote! {
            struct App {
                #[element("a")]
                #[page(title = "x")]
                link: Leaf,
            }
        });
        assert!(err.contains("expected `name`"));
    }

    #[test]
    fn test_tuple_struct_and_enum_rejected() {
        assert!(expand_err(parse_quote! { struct Tuple(Leaf); }).contains("named fields"));
        assert!(expand_err(parse_quote! { enum Page { A } }).contains("structs"));
    }
}
