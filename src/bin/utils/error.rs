// Peregrine Assembler and SHIMMER Genome Assembly Toolkit
// 2019, 2020, 2021- (c) by Jason, Chen-Shan, Chin
//
// This Source Code Form is subject to the terms of the
// Creative Commons Attribution-NonCommercial-ShareAlike 4.0 International License.
//
// You should have received a copy of the license along with this
// work. If not, see <http://creativecommons.org/licenses/by-nc-sa/4.0/>.

#![allow(dead_code)]

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScaffoldError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // malformed clm / ids / tour records
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    // the tour evaluator failed or returned a non-finite score
    #[error("evaluator error: {message}")]
    Evaluator { message: String },

    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

pub type Result<T> = std::result::Result<T, ScaffoldError>;

impl ScaffoldError {
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    pub fn evaluator(message: impl Into<String>) -> Self {
        Self::Evaluator {
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}
