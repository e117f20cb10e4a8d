//! Common front-end fixtures for tests.

use j2x::syntax::{
    AnnotationEvidence, FieldDecl, ImportDecl, OperationDecl, SourceUnit, TypeDecl, TypeKind,
};

pub fn ann(name: &str) -> AnnotationEvidence {
    AnnotationEvidence::new(name)
}

/// A small JPA-style shop: a bidirectional Customer/Order pair, an embedded
/// Address, an enum, an element collection and a service with signatures.
pub fn shop_units() -> Vec<SourceUnit> {
    vec![
        SourceUnit::new("src/shop/model/Customer.java", "shop.model")
            .with_import(ImportDecl::wildcard("javax.persistence"))
            .with_import(ImportDecl::single("java.util.List"))
            .with_type(
                TypeDecl::class("Customer")
                    .with_annotation(ann("Entity"))
                    .with_field(FieldDecl::new("id", "Long").with_annotation(ann("Id")))
                    .with_field(FieldDecl::new("name", "String").with_annotation(ann("NotNull")))
                    .with_field(
                        FieldDecl::new("orders", "List<Order>").with_annotation(
                            ann("OneToMany").with_value("mappedBy", "\"customer\""),
                        ),
                    )
                    .with_field(
                        FieldDecl::new("address", "Address").with_annotation(ann("Embedded")),
                    )
                    .with_field(FieldDecl::new("status", "Status")),
            ),
        SourceUnit::new("src/shop/model/Order.java", "shop.model")
            .with_import(ImportDecl::wildcard("javax.persistence"))
            .with_type(
                TypeDecl::class("Order")
                    .with_annotation(ann("Entity"))
                    .with_field(
                        FieldDecl::new("customer", "Customer").with_annotation(
                            ann("ManyToOne").with_value("optional", "false"),
                        ),
                    )
                    .with_field(
                        FieldDecl::new("tags", "java.util.Set<String>")
                            .with_annotation(ann("ElementCollection")),
                    )
                    .with_field(FieldDecl::new("cache", "Object").with_transient(true)),
            ),
        SourceUnit::new("src/shop/model/Address.java", "shop.model").with_type(
            TypeDecl::class("Address")
                .with_annotation(ann("Embeddable"))
                .with_field(FieldDecl::new("street", "String")),
        ),
        SourceUnit::new("src/shop/model/Status.java", "shop.model").with_type(
            TypeDecl::new("Status", TypeKind::Enum)
                .with_enum_literal("OPEN")
                .with_enum_literal("CLOSED"),
        ),
        SourceUnit::new("src/shop/service/OrderService.java", "shop.service")
            .with_import(ImportDecl::single("shop.model.Order"))
            .with_import(ImportDecl::single("shop.model.Customer"))
            .with_type(
                TypeDecl::interface("OrderService")
                    .with_operation(
                        OperationDecl::method("place", "Order")
                            .with_param("customer", "Customer")
                            .with_abstract(true),
                    ),
            ),
    ]
}
