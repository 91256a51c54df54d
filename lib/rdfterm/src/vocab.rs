//! [`NamedNodeRef`](super::NamedNodeRef) constants for the vocabularies the syntaxes give a meaning to.

/// Declares one constant per term, its IRI being the namespace followed by the local name.
macro_rules! vocabulary {
    ($namespace:literal { $($(#[$doc:meta])* $name:ident = $local:literal),+ $(,)? }) => {
        use crate::named_node::NamedNodeRef;

        $(
            $(#[$doc])*
            pub const $name: NamedNodeRef<'_> =
                NamedNodeRef::new_unchecked(concat!($namespace, $local));
        )+
    };
}

pub mod rdf {
    //! [RDF](https://www.w3.org/TR/rdf11-concepts/) vocabulary.

    pub const NAMESPACE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

    vocabulary!("http://www.w3.org/1999/02/22-rdf-syntax-ns#" {
        FIRST = "first",
        /// The datatype of RDFa `rdf:HTML` literals.
        HTML = "HTML",
        LANG_STRING = "langString",
        /// The empty list.
        NIL = "nil",
        OBJECT = "object",
        PREDICATE = "predicate",
        REST = "rest",
        /// The type of reified statements.
        STATEMENT = "Statement",
        SUBJECT = "subject",
        TYPE = "type",
        XML_LITERAL = "XMLLiteral",
    });
}

pub mod rdfs {
    //! [RDFS](https://www.w3.org/TR/rdf-schema/) vocabulary.

    pub const NAMESPACE: &str = "http://www.w3.org/2000/01/rdf-schema#";

    vocabulary!("http://www.w3.org/2000/01/rdf-schema#" {
        COMMENT = "comment",
        LABEL = "label",
    });
}

pub mod xsd {
    //! The [XSD datatypes](https://www.w3.org/TR/rdf11-concepts/#dfn-rdf-compatible-xsd-types) native JSON values and syntax shortcuts map to.

    vocabulary!("http://www.w3.org/2001/XMLSchema#" {
        BOOLEAN = "boolean",
        DATE = "date",
        DATE_TIME = "dateTime",
        DECIMAL = "decimal",
        DOUBLE = "double",
        DURATION = "duration",
        G_YEAR = "gYear",
        G_YEAR_MONTH = "gYearMonth",
        INTEGER = "integer",
        /// Simple literals have this datatype.
        STRING = "string",
        TIME = "time",
        TOKEN = "token",
    });
}

pub mod owl {
    //! The N3 `=` shortcut.

    vocabulary!("http://www.w3.org/2002/07/owl#" {
        SAME_AS = "sameAs",
    });
}

pub mod log {
    //! The N3 `=>` and `<=` shortcuts.

    vocabulary!("http://www.w3.org/2000/10/swap/log#" {
        IMPLIES = "implies",
    });
}
