//! Hand-written recursive-descent parser for Thrift IDL. Consumes the
//! flat token stream produced by [`crate::lexer`] and produces a
//! [`Program`]; every node it builds carries the line number of the
//! token it started from.

use std::iter::Peekable;
use std::vec::IntoIter;

use crate::ast::{
    Annotation, ConstDef, ConstValue, Definition, EnumDef, EnumItem, Field, FunctionDef, Header,
    IncludeHeader, NamespaceHeader, Program, Requiredness, ServiceDef, StructDef, StructKind,
    TypeNode, TypedefDef,
};
use crate::error::ParserError;
use crate::lexer::{tokenize, Token, TokenKind};

/// Parses a complete `.thrift` source string into a [`Program`].
pub fn parse(src: &str) -> Result<Program, ParserError> {
    let tokens = tokenize(src)?;
    let mut parser = Parser {
        tokens: tokens.into_iter().peekable(),
        lineno: 1,
    };
    parser.parse_program()
}

struct Parser {
    tokens: Peekable<IntoIter<Token>>,
    lineno: usize,
}

impl Parser {
    fn peek(&mut self) -> Option<&TokenKind> {
        self.tokens.peek().map(|t| &t.kind)
    }

    fn next(&mut self) -> Result<Token, ParserError> {
        let token = self.tokens.next().ok_or_else(ParserError::eof)?;
        self.lineno = token.lineno;
        Ok(token)
    }

    fn expect(&mut self, expected: &TokenKind) -> Result<Token, ParserError> {
        let token = self.next()?;
        if &token.kind != expected {
            return Err(ParserError::new(
                format!(
                    "expected {}, found {}",
                    expected.describe(),
                    token.kind.describe()
                ),
                Some(token.lineno),
            ));
        }
        Ok(token)
    }

    fn eat(&mut self, expected: &TokenKind) -> bool {
        if self.peek() == Some(expected) {
            self.tokens.next();
            true
        } else {
            false
        }
    }

    fn identifier(&mut self) -> Result<(String, usize), ParserError> {
        let token = self.next()?;
        match token.kind {
            TokenKind::Identifier(name) => Ok((name, token.lineno)),
            other => Err(ParserError::new(
                format!("expected identifier, found {}", other.describe()),
                Some(token.lineno),
            )),
        }
    }

    /// A trailing list separator between fields/enum items/parameters:
    /// Thrift accepts `,` or `;` interchangeably and either may be
    /// omitted before a closing brace.
    fn eat_list_separator(&mut self) {
        let _ = self.eat(&TokenKind::Comma) || self.eat(&TokenKind::Semicolon);
    }

    fn parse_program(&mut self) -> Result<Program, ParserError> {
        let mut program = Program::default();

        loop {
            match self.peek() {
                None => break,
                Some(TokenKind::Include) => {
                    program.headers.push(Header::Include(self.parse_include()?))
                }
                Some(TokenKind::Namespace) => program
                    .headers
                    .push(Header::Namespace(self.parse_namespace()?)),
                Some(_) => program.definitions.push(self.parse_definition()?),
            }
        }

        Ok(program)
    }

    fn parse_include(&mut self) -> Result<IncludeHeader, ParserError> {
        let lineno = self.expect(&TokenKind::Include)?.lineno;

        // Optional alias form: `include alias "path"`.
        let alias = if let Some(TokenKind::Identifier(_)) = self.peek() {
            Some(self.identifier()?.0)
        } else {
            None
        };

        let path = self.string_literal()?;
        Ok(IncludeHeader {
            path,
            alias,
            lineno,
        })
    }

    fn parse_namespace(&mut self) -> Result<NamespaceHeader, ParserError> {
        let lineno = self.expect(&TokenKind::Namespace)?.lineno;
        let (scope, _) = self.namespace_scope()?;
        let (name, _) = self.identifier()?;
        Ok(NamespaceHeader {
            scope,
            name,
            lineno,
        })
    }

    /// The namespace scope is either `*` (all languages) or an
    /// identifier (`rs`, `py`, `java.swift`, …).
    fn namespace_scope(&mut self) -> Result<(String, usize), ParserError> {
        if self.eat(&TokenKind::Star) {
            return Ok(("*".to_string(), self.lineno));
        }
        self.identifier()
    }

    fn string_literal(&mut self) -> Result<String, ParserError> {
        let token = self.next()?;
        match token.kind {
            TokenKind::StringLiteral(s) => Ok(s),
            other => Err(ParserError::new(
                format!("expected string literal, found {}", other.describe()),
                Some(token.lineno),
            )),
        }
    }

    fn parse_definition(&mut self) -> Result<Definition, ParserError> {
        match self.peek() {
            Some(TokenKind::Const) => Ok(Definition::Const(self.parse_const()?)),
            Some(TokenKind::Typedef) => Ok(Definition::Typedef(self.parse_typedef()?)),
            Some(TokenKind::Enum) => Ok(Definition::Enum(self.parse_enum()?)),
            Some(TokenKind::Struct) => {
                Ok(Definition::Struct(self.parse_struct_like(StructKind::Struct)?))
            }
            Some(TokenKind::Union) => {
                Ok(Definition::Struct(self.parse_struct_like(StructKind::Union)?))
            }
            Some(TokenKind::Exception) => Ok(Definition::Struct(
                self.parse_struct_like(StructKind::Exception)?,
            )),
            Some(TokenKind::Service) => Ok(Definition::Service(self.parse_service()?)),
            Some(other) => Err(ParserError::new(
                format!("expected a definition, found {}", other.describe()),
                Some(self.lineno),
            )),
            None => Err(ParserError::eof()),
        }
    }

    fn parse_const(&mut self) -> Result<ConstDef, ParserError> {
        let lineno = self.expect(&TokenKind::Const)?.lineno;
        let ty = self.parse_type()?;
        let (name, _) = self.identifier()?;
        self.expect(&TokenKind::Equals)?;
        let value = self.parse_const_value()?;
        self.eat_list_separator();
        Ok(ConstDef {
            name,
            ty,
            value,
            lineno,
        })
    }

    fn parse_typedef(&mut self) -> Result<TypedefDef, ParserError> {
        let lineno = self.expect(&TokenKind::Typedef)?.lineno;
        let target = self.parse_type()?;
        let (name, _) = self.identifier()?;
        let annotations = self.parse_opt_annotations()?;
        Ok(TypedefDef {
            name,
            target,
            annotations,
            lineno,
        })
    }

    fn parse_enum(&mut self) -> Result<EnumDef, ParserError> {
        let lineno = self.expect(&TokenKind::Enum)?.lineno;
        let (name, _) = self.identifier()?;
        self.expect(&TokenKind::LBrace)?;

        let mut items = Vec::new();
        while self.peek() != Some(&TokenKind::RBrace) {
            let (item_name, item_lineno) = self.identifier()?;
            let value = if self.eat(&TokenKind::Equals) {
                Some(self.parse_int_literal()? as i32)
            } else {
                None
            };
            let annotations = self.parse_opt_annotations()?;
            self.eat_list_separator();
            items.push(EnumItem {
                name: item_name,
                value,
                annotations,
                lineno: item_lineno,
            });
        }
        self.expect(&TokenKind::RBrace)?;
        let annotations = self.parse_opt_annotations()?;

        Ok(EnumDef {
            name,
            items,
            annotations,
            lineno,
        })
    }

    fn parse_struct_like(&mut self, kind: StructKind) -> Result<StructDef, ParserError> {
        let lineno = self.next()?.lineno; // struct/union/exception keyword
        let (name, _) = self.identifier()?;
        self.expect(&TokenKind::LBrace)?;

        let mut fields = Vec::new();
        while self.peek() != Some(&TokenKind::RBrace) {
            fields.push(self.parse_field()?);
        }
        self.expect(&TokenKind::RBrace)?;
        let annotations = self.parse_opt_annotations()?;

        Ok(StructDef {
            kind,
            name,
            fields,
            annotations,
            lineno,
        })
    }

    /// `<id>: [required|optional] <type> <name> [= <default>] [annotations] [,;]`
    fn parse_field(&mut self) -> Result<Field, ParserError> {
        let lineno = self.lineno;
        let id_token = self.next()?;
        let id = match id_token.kind {
            TokenKind::IntConst(v) => v,
            other => {
                return Err(ParserError::new(
                    format!("expected field id, found {}", other.describe()),
                    Some(id_token.lineno),
                ))
            }
        };
        if id == 0 {
            return Err(ParserError::new(
                "field id 0 is reserved and may not be used",
                Some(id_token.lineno),
            ));
        }
        if !(i16::MIN as i64..=i16::MAX as i64).contains(&id) {
            return Err(ParserError::new(
                format!("field id {id} does not fit in a signed 16-bit integer"),
                Some(id_token.lineno),
            ));
        }
        self.expect(&TokenKind::Colon)?;

        let requiredness = match self.peek() {
            Some(TokenKind::Required) => {
                self.next()?;
                Requiredness::Required
            }
            Some(TokenKind::Optional) => {
                self.next()?;
                Requiredness::Optional
            }
            _ => Requiredness::Default,
        };

        let ty = self.parse_type()?;
        let (name, name_lineno) = self.identifier()?;

        let default = if self.eat(&TokenKind::Equals) {
            Some(self.parse_const_value()?)
        } else {
            None
        };

        let annotations = self.parse_opt_annotations()?;
        self.eat_list_separator();

        Ok(Field {
            id: id as i16,
            name,
            ty,
            requiredness,
            default,
            annotations,
            lineno: name_lineno,
        })
    }

    fn parse_service(&mut self) -> Result<ServiceDef, ParserError> {
        let lineno = self.expect(&TokenKind::Service)?.lineno;
        let (name, _) = self.identifier()?;

        let extends = if self.eat(&TokenKind::Extends) {
            Some(self.identifier()?.0)
        } else {
            None
        };

        self.expect(&TokenKind::LBrace)?;
        let mut functions = Vec::new();
        while self.peek() != Some(&TokenKind::RBrace) {
            functions.push(self.parse_function()?);
        }
        self.expect(&TokenKind::RBrace)?;
        let annotations = self.parse_opt_annotations()?;

        Ok(ServiceDef {
            name,
            extends,
            functions,
            annotations,
            lineno,
        })
    }

    fn parse_function(&mut self) -> Result<FunctionDef, ParserError> {
        let lineno = self.lineno;
        let oneway = self.eat(&TokenKind::Oneway);

        let return_type = if self.eat(&TokenKind::Void) {
            None
        } else {
            Some(self.parse_type()?)
        };

        let (name, _) = self.identifier()?;
        self.expect(&TokenKind::LParen)?;
        let mut params = Vec::new();
        while self.peek() != Some(&TokenKind::RParen) {
            params.push(self.parse_field()?);
        }
        self.expect(&TokenKind::RParen)?;

        let mut throws = Vec::new();
        if self.eat(&TokenKind::Throws) {
            self.expect(&TokenKind::LParen)?;
            while self.peek() != Some(&TokenKind::RParen) {
                throws.push(self.parse_field()?);
            }
            self.expect(&TokenKind::RParen)?;
        }

        let annotations = self.parse_opt_annotations()?;
        self.eat_list_separator();

        Ok(FunctionDef {
            name,
            oneway,
            return_type,
            params,
            throws,
            annotations,
            lineno,
        })
    }

    /// `bool | byte | i8 | i16 | i32 | i64 | double | string | binary |
    /// list<T> | set<T> | map<K,V> | <identifier>`
    fn parse_type(&mut self) -> Result<TypeNode, ParserError> {
        let token = self.next()?;
        Ok(match token.kind {
            TokenKind::BoolType => TypeNode::Bool,
            TokenKind::Byte => TypeNode::Byte,
            TokenKind::I16 => TypeNode::I16,
            TokenKind::I32 => TypeNode::I32,
            TokenKind::I64 => TypeNode::I64,
            TokenKind::Double => TypeNode::Double,
            TokenKind::StringType => TypeNode::String,
            TokenKind::Binary => TypeNode::Binary,
            TokenKind::List => {
                self.expect(&TokenKind::LAngle)?;
                let inner = self.parse_type()?;
                self.expect(&TokenKind::RAngle)?;
                TypeNode::List(Box::new(inner), token.lineno)
            }
            TokenKind::Set => {
                self.expect(&TokenKind::LAngle)?;
                let inner = self.parse_type()?;
                self.expect(&TokenKind::RAngle)?;
                TypeNode::Set(Box::new(inner), token.lineno)
            }
            TokenKind::Map => {
                self.expect(&TokenKind::LAngle)?;
                let key = self.parse_type()?;
                self.expect(&TokenKind::Comma)?;
                let value = self.parse_type()?;
                self.expect(&TokenKind::RAngle)?;
                TypeNode::Map(Box::new(key), Box::new(value), token.lineno)
            }
            TokenKind::Identifier(name) if name == "i8" => TypeNode::Byte,
            TokenKind::Identifier(name) => TypeNode::Reference(name, token.lineno),
            other => {
                return Err(ParserError::new(
                    format!("expected a type, found {}", other.describe()),
                    Some(token.lineno),
                ))
            }
        })
    }

    fn parse_int_literal(&mut self) -> Result<i64, ParserError> {
        let token = self.next()?;
        match token.kind {
            TokenKind::IntConst(v) => Ok(v),
            other => Err(ParserError::new(
                format!("expected an integer, found {}", other.describe()),
                Some(token.lineno),
            )),
        }
    }

    /// Primitive, list literal (`[a, b]`), map literal (`{k: v, k2: v2}`,
    /// comma- or semicolon-separated), or an identifier reference.
    fn parse_const_value(&mut self) -> Result<ConstValue, ParserError> {
        let token = self.next()?;
        match token.kind {
            TokenKind::BoolConst(b) => Ok(ConstValue::Bool(b, token.lineno)),
            TokenKind::IntConst(v) => Ok(ConstValue::Int(v, token.lineno)),
            TokenKind::DubConst(v) => Ok(ConstValue::Double(v, token.lineno)),
            TokenKind::StringLiteral(s) => Ok(ConstValue::String(s, token.lineno)),
            TokenKind::Identifier(name) => Ok(ConstValue::Reference(name, token.lineno)),
            TokenKind::LBracket => {
                let mut items = Vec::new();
                while self.peek() != Some(&TokenKind::RBracket) {
                    items.push(self.parse_const_value()?);
                    self.eat_list_separator();
                }
                self.expect(&TokenKind::RBracket)?;
                Ok(ConstValue::List(items, token.lineno))
            }
            TokenKind::LBrace => {
                let mut entries = Vec::new();
                while self.peek() != Some(&TokenKind::RBrace) {
                    let key = self.parse_const_value()?;
                    self.expect(&TokenKind::Colon)?;
                    let value = self.parse_const_value()?;
                    entries.push((key, value));
                    self.eat_list_separator();
                }
                self.expect(&TokenKind::RBrace)?;
                Ok(ConstValue::Map(entries, token.lineno))
            }
            other => Err(ParserError::new(
                format!("expected a constant value, found {}", other.describe()),
                Some(token.lineno),
            )),
        }
    }

    fn parse_opt_annotations(&mut self) -> Result<Annotation, ParserError> {
        if !self.eat(&TokenKind::LParen) {
            return Ok(Annotation::default());
        }

        let mut entries = Vec::new();
        while self.peek() != Some(&TokenKind::RParen) {
            let (key, _) = self.identifier()?;
            let value = if self.eat(&TokenKind::Equals) {
                Some(self.string_literal()?)
            } else {
                None
            };
            entries.push((key, value));
            self.eat_list_separator();
        }
        self.expect(&TokenKind::RParen)?;
        Ok(Annotation { entries })
    }
}
