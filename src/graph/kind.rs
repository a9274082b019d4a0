use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};

/// Kind of declaration as reported by the index.
///
/// The same enum tags references: a reference carries the kind of the
/// declaration it points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
    // Types
    Associatedtype,
    Class,
    Enum,
    Enumelement,
    Protocol,
    Struct,
    Typealias,
    GenericTypeParam,

    // Extensions
    Extension,
    ExtensionClass,
    ExtensionEnum,
    ExtensionProtocol,
    ExtensionStruct,

    // Accessors
    FunctionAccessorAddress,
    FunctionAccessorDidset,
    FunctionAccessorGetter,
    FunctionAccessorInit,
    FunctionAccessorModify,
    FunctionAccessorMutableaddress,
    FunctionAccessorRead,
    FunctionAccessorSetter,
    FunctionAccessorWillset,

    // Functions
    FunctionConstructor,
    FunctionDestructor,
    FunctionFree,
    FunctionMethodClass,
    FunctionMethodInstance,
    FunctionMethodStatic,
    FunctionOperator,
    FunctionOperatorInfix,
    FunctionOperatorPostfix,
    FunctionOperatorPrefix,
    FunctionSubscript,
    Macro,

    // Variables
    VarClass,
    VarGlobal,
    VarInstance,
    VarLocal,
    VarParameter,
    VarStatic,

    // Other
    Module,
    PrecedenceGroup,
}

/// Coarse grouping of declaration kinds.
///
/// Every kind belongs to exactly one family; the mapping is an exhaustive
/// match so adding a kind forces a decision here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KindFamily {
    Type,
    GenericParameter,
    Extension,
    Accessor,
    Function,
    Variable,
    Module,
    PrecedenceGroup,
}

impl DeclarationKind {
    pub const ALL: [DeclarationKind; 42] = [
        DeclarationKind::Associatedtype,
        DeclarationKind::Class,
        DeclarationKind::Enum,
        DeclarationKind::Enumelement,
        DeclarationKind::Protocol,
        DeclarationKind::Struct,
        DeclarationKind::Typealias,
        DeclarationKind::GenericTypeParam,
        DeclarationKind::Extension,
        DeclarationKind::ExtensionClass,
        DeclarationKind::ExtensionEnum,
        DeclarationKind::ExtensionProtocol,
        DeclarationKind::ExtensionStruct,
        DeclarationKind::FunctionAccessorAddress,
        DeclarationKind::FunctionAccessorDidset,
        DeclarationKind::FunctionAccessorGetter,
        DeclarationKind::FunctionAccessorInit,
        DeclarationKind::FunctionAccessorModify,
        DeclarationKind::FunctionAccessorMutableaddress,
        DeclarationKind::FunctionAccessorRead,
        DeclarationKind::FunctionAccessorSetter,
        DeclarationKind::FunctionAccessorWillset,
        DeclarationKind::FunctionConstructor,
        DeclarationKind::FunctionDestructor,
        DeclarationKind::FunctionFree,
        DeclarationKind::FunctionMethodClass,
        DeclarationKind::FunctionMethodInstance,
        DeclarationKind::FunctionMethodStatic,
        DeclarationKind::FunctionOperator,
        DeclarationKind::FunctionOperatorInfix,
        DeclarationKind::FunctionOperatorPostfix,
        DeclarationKind::FunctionOperatorPrefix,
        DeclarationKind::FunctionSubscript,
        DeclarationKind::Macro,
        DeclarationKind::VarClass,
        DeclarationKind::VarGlobal,
        DeclarationKind::VarInstance,
        DeclarationKind::VarLocal,
        DeclarationKind::VarParameter,
        DeclarationKind::VarStatic,
        DeclarationKind::Module,
        DeclarationKind::PrecedenceGroup,
    ];

    pub const EXTENSIONS: [DeclarationKind; 5] = [
        DeclarationKind::Extension,
        DeclarationKind::ExtensionClass,
        DeclarationKind::ExtensionEnum,
        DeclarationKind::ExtensionProtocol,
        DeclarationKind::ExtensionStruct,
    ];

    pub const ACCESSORS: [DeclarationKind; 9] = [
        DeclarationKind::FunctionAccessorAddress,
        DeclarationKind::FunctionAccessorDidset,
        DeclarationKind::FunctionAccessorGetter,
        DeclarationKind::FunctionAccessorInit,
        DeclarationKind::FunctionAccessorModify,
        DeclarationKind::FunctionAccessorMutableaddress,
        DeclarationKind::FunctionAccessorRead,
        DeclarationKind::FunctionAccessorSetter,
        DeclarationKind::FunctionAccessorWillset,
    ];

    /// Kinds a conforming type may use to satisfy a protocol requirement.
    pub const PROTOCOL_MEMBER_CONFORMING: [DeclarationKind; 13] = [
        DeclarationKind::FunctionConstructor,
        DeclarationKind::FunctionMethodClass,
        DeclarationKind::FunctionMethodInstance,
        DeclarationKind::FunctionMethodStatic,
        DeclarationKind::FunctionOperator,
        DeclarationKind::FunctionOperatorInfix,
        DeclarationKind::FunctionOperatorPostfix,
        DeclarationKind::FunctionOperatorPrefix,
        DeclarationKind::FunctionSubscript,
        DeclarationKind::VarClass,
        DeclarationKind::VarInstance,
        DeclarationKind::VarStatic,
        DeclarationKind::Associatedtype,
    ];

    pub fn family(self) -> KindFamily {
        use DeclarationKind::*;
        match self {
            Associatedtype | Class | Enum | Enumelement | Protocol | Struct | Typealias => {
                KindFamily::Type
            }
            GenericTypeParam => KindFamily::GenericParameter,
            Extension | ExtensionClass | ExtensionEnum | ExtensionProtocol | ExtensionStruct => {
                KindFamily::Extension
            }
            FunctionAccessorAddress
            | FunctionAccessorDidset
            | FunctionAccessorGetter
            | FunctionAccessorInit
            | FunctionAccessorModify
            | FunctionAccessorMutableaddress
            | FunctionAccessorRead
            | FunctionAccessorSetter
            | FunctionAccessorWillset => KindFamily::Accessor,
            FunctionConstructor
            | FunctionDestructor
            | FunctionFree
            | FunctionMethodClass
            | FunctionMethodInstance
            | FunctionMethodStatic
            | FunctionOperator
            | FunctionOperatorInfix
            | FunctionOperatorPostfix
            | FunctionOperatorPrefix
            | FunctionSubscript
            | Macro => KindFamily::Function,
            VarClass | VarGlobal | VarInstance | VarLocal | VarParameter | VarStatic => {
                KindFamily::Variable
            }
            Module => KindFamily::Module,
            PrecedenceGroup => KindFamily::PrecedenceGroup,
        }
    }

    pub fn is_extension(self) -> bool {
        self.family() == KindFamily::Extension
    }

    pub fn is_accessor(self) -> bool {
        self.family() == KindFamily::Accessor
    }

    /// Functions, including accessors.
    pub fn is_function(self) -> bool {
        matches!(self.family(), KindFamily::Function | KindFamily::Accessor)
    }

    pub fn is_variable(self) -> bool {
        self.family() == KindFamily::Variable
    }

    pub fn is_type(self) -> bool {
        self.family() == KindFamily::Type
    }

    /// Class, struct and enum: kinds that can be instantiated and extended.
    pub fn is_concrete_type(self) -> bool {
        matches!(
            self,
            DeclarationKind::Class | DeclarationKind::Struct | DeclarationKind::Enum
        )
    }

    pub fn is_protocol_member_conforming(self) -> bool {
        Self::PROTOCOL_MEMBER_CONFORMING.contains(&self)
    }

    /// Stored or computed properties that can own accessors.
    pub fn is_property(self) -> bool {
        matches!(
            self,
            DeclarationKind::VarClass
                | DeclarationKind::VarGlobal
                | DeclarationKind::VarInstance
                | DeclarationKind::VarStatic
        )
    }

    /// The kind of type an extension kind extends.
    ///
    /// A plain `Extension` carries no information about what it extends;
    /// reaching this with one is a front-end contract violation.
    pub fn extended_kind(self) -> Result<DeclarationKind, AnalysisError> {
        match self {
            DeclarationKind::ExtensionClass => Ok(DeclarationKind::Class),
            DeclarationKind::ExtensionEnum => Ok(DeclarationKind::Enum),
            DeclarationKind::ExtensionProtocol => Ok(DeclarationKind::Protocol),
            DeclarationKind::ExtensionStruct => Ok(DeclarationKind::Struct),
            other => Err(AnalysisError::UnmappedExtensionKind(other)),
        }
    }

    /// Kinds that may satisfy a requirement of this kind.
    ///
    /// A static requirement can be met by a class member, and a protocol
    /// typealias or associated type can be met by a nested type.
    pub fn equivalent_conforming_kinds(self) -> &'static [DeclarationKind] {
        use DeclarationKind::*;
        match self {
            FunctionMethodStatic | FunctionMethodClass => {
                &[FunctionMethodStatic, FunctionMethodClass]
            }
            VarStatic | VarClass => &[VarStatic, VarClass],
            Associatedtype | Typealias => &[Associatedtype, Typealias, Class, Struct, Enum],
            FunctionOperator | FunctionOperatorInfix | FunctionOperatorPostfix
            | FunctionOperatorPrefix => &[
                FunctionOperator,
                FunctionOperatorInfix,
                FunctionOperatorPostfix,
                FunctionOperatorPrefix,
                FunctionMethodStatic,
            ],
            FunctionConstructor => &[FunctionConstructor],
            FunctionMethodInstance => &[FunctionMethodInstance],
            FunctionSubscript => &[FunctionSubscript],
            VarInstance => &[VarInstance],
            _ => &[],
        }
    }

    pub fn display_name(self) -> &'static str {
        use DeclarationKind::*;
        match self {
            Associatedtype => "associatedtype",
            Class => "class",
            Enum => "enum",
            Enumelement => "enum case",
            Protocol => "protocol",
            Struct => "struct",
            Typealias => "typealias",
            GenericTypeParam => "generic type parameter",
            Extension | ExtensionClass | ExtensionEnum | ExtensionProtocol | ExtensionStruct => {
                "extension"
            }
            FunctionAccessorAddress | FunctionAccessorMutableaddress => "addressor",
            FunctionAccessorDidset => "didSet",
            FunctionAccessorGetter => "getter",
            FunctionAccessorInit => "init accessor",
            FunctionAccessorModify => "modify accessor",
            FunctionAccessorRead => "read accessor",
            FunctionAccessorSetter => "setter",
            FunctionAccessorWillset => "willSet",
            FunctionConstructor => "initializer",
            FunctionDestructor => "deinitializer",
            FunctionFree => "function",
            FunctionMethodClass | FunctionMethodInstance | FunctionMethodStatic => "function",
            FunctionOperator | FunctionOperatorInfix | FunctionOperatorPostfix
            | FunctionOperatorPrefix => "operator",
            FunctionSubscript => "subscript",
            Macro => "macro",
            VarClass | VarGlobal | VarInstance | VarStatic => "property",
            VarLocal => "variable",
            VarParameter => "parameter",
            Module => "module",
            PrecedenceGroup => "precedence group",
        }
    }
}

impl std::fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
