// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

mod field;
mod lexer;
mod mapping;
mod parser;
mod registry;
mod value;
