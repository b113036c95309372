/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Compile-once match expressions evaluated against message attributes.
//!
//! Grammar: one or more clauses joined by `&&`, each clause
//! `path == "literal"` or `path != "literal"`. Paths may carry an optional
//! `event.` prefix (`event.type == "v2"` and `type == "v2"` are equivalent).
//! Evaluation is pure and never errors: a missing attribute makes its clause
//! false for both operators rather than raising.

use crate::envelope::Message;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Compile-time failures for match expressions.
///
/// These surface at registration; a rule with an uncompilable expression is
/// rejected before it can receive traffic.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ExpressionError {
    Empty,
    MissingOperator(String),
    BadAttribute(String),
    BadLiteral(String),
}

impl Display for ExpressionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpressionError::Empty => write!(f, "expression is empty"),
            ExpressionError::MissingOperator(clause) => {
                write!(f, "clause is missing an `==` or `!=` operator: `{clause}`")
            }
            ExpressionError::BadAttribute(clause) => {
                write!(f, "clause has no usable attribute path: `{clause}`")
            }
            ExpressionError::BadLiteral(clause) => {
                write!(f, "clause literal must be a double-quoted string: `{clause}`")
            }
        }
    }
}

impl Error for ExpressionError {}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum ClauseOp {
    Eq,
    Ne,
}

#[derive(Clone, Debug)]
struct Clause {
    attribute: String,
    op: ClauseOp,
    literal: String,
}

impl Clause {
    fn compile(raw: &str) -> Result<Self, ExpressionError> {
        let (op, op_index, op_len) = match (raw.find("=="), raw.find("!=")) {
            (Some(eq), Some(ne)) if ne < eq => (ClauseOp::Ne, ne, 2),
            (Some(eq), _) => (ClauseOp::Eq, eq, 2),
            (None, Some(ne)) => (ClauseOp::Ne, ne, 2),
            (None, None) => return Err(ExpressionError::MissingOperator(raw.to_string())),
        };

        let path = raw[..op_index].trim();
        let attribute = path.strip_prefix("event.").unwrap_or(path);
        if attribute.is_empty() || attribute.contains(char::is_whitespace) {
            return Err(ExpressionError::BadAttribute(raw.to_string()));
        }

        let literal_raw = raw[op_index + op_len..].trim();
        let literal = literal_raw
            .strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))
            .filter(|inner| !inner.contains('"'))
            .ok_or_else(|| ExpressionError::BadLiteral(raw.to_string()))?;

        Ok(Self {
            attribute: attribute.to_string(),
            op,
            literal: literal.to_string(),
        })
    }

    fn matches(&self, message: &Message) -> bool {
        // Absent attributes fail the clause for both operators; absence is a
        // type mismatch, not a negative match.
        match message.attribute(&self.attribute) {
            Some(value) => match self.op {
                ClauseOp::Eq => value == self.literal,
                ClauseOp::Ne => value != self.literal,
            },
            None => false,
        }
    }
}

/// A compiled boolean predicate over a message's typed attributes.
#[derive(Clone, Debug)]
pub struct MatchExpression {
    source: String,
    clauses: Vec<Clause>,
}

impl MatchExpression {
    /// Compiles an expression string, validating every clause.
    pub fn compile(source: &str) -> Result<Self, ExpressionError> {
        let trimmed = source.trim();
        if trimmed.is_empty() {
            return Err(ExpressionError::Empty);
        }

        let clauses = trimmed
            .split("&&")
            .map(Clause::compile)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            source: trimmed.to_string(),
            clauses,
        })
    }

    /// Evaluates the expression; all clauses must hold.
    pub fn matches(&self, message: &Message) -> bool {
        self.clauses.iter().all(|clause| clause.matches(message))
    }

    /// The normalized source text, kept for registration-time diagnostics.
    pub fn source(&self) -> &str {
        &self.source
    }
}
