mod traits;

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};
use traits::StructFields;

/// Note: all derives implemented below `charybdis_model` will be automatically implemented for all partial models.
/// So by implementing the `Ownership` derive for the `Task` model, it will be implemented for
/// `UpdateDetailsTask`, `UpdateAssigneeTask`, etc. as long as the partial keeps the `author_id` column.
/// Partials without an `author_id` column get no impl and must be authorized through the native model.
#[proc_macro_derive(Ownership)]
pub fn ownership_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let has_field = |field_name: &str| {
        input.struct_fields().iter().any(|field| match field.ident {
            Some(ref ident) => ident == field_name,
            None => false,
        })
    };

    if !has_field("author_id") {
        return TokenStream::new();
    }

    let assignee_id = if has_field("assignee_id") {
        quote! {
            fn assignee_id(&self) -> Option<Uuid> {
                self.assignee_id
            }
        }
    } else {
        quote! {
            fn assignee_id(&self) -> Option<Uuid> {
                None
            }
        }
    };

    let expanded = quote! {
        impl crate::models::traits::OwnershipFields for #name {
            fn author_id(&self) -> Uuid {
                self.author_id
            }

            #assignee_id
        }
    };

    TokenStream::from(expanded)
}
