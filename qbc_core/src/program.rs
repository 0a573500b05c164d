//! Compiled-module data model.
//!
//! The code generator lowers an analyzed program into this form: a flat
//! statement list per scope, interleaved with labels, where each runnable
//! statement is an instruction record whose execution may yield a control
//! directive. The whole model serializes to a line-oriented JSON record
//! stream (one record per statement) so that a source map can key on line
//! numbers in the emitted text; [`parse_module_source`] reassembles it.

use serde::{Deserialize, Serialize};

use crate::error::RuntimeError;
use crate::types::TypeSpec;

/// A position in the original source text, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loc {
    pub line: u32,
    pub col: u32,
}

impl Loc {
    pub fn new(line: u32, col: u32) -> Self {
        Loc { line, col }
    }
}

impl std::fmt::Display for Loc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, col {}", self.line, self.col)
    }
}

/// Storage class of a variable slot at run time.
///
/// Module-level declarations live in the global store; `Local` and `Param`
/// name slots in the executing frame. Temps are a fourth class addressed
/// only through [`StoreRef::Temp`] and [`CExpr::Temp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VarScope {
    Param,
    Local,
    Global,
}

/// A named, typed slot; frames pre-initialize one default value per slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeSpec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    IntDiv,
    Mod,
    Pow,
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnOp {
    Neg,
    Not,
}

/// Lowered expression form evaluated by the executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum CExpr {
    NumLit { value: f64 },
    StrLit { value: String },
    Var { name: String, scope: VarScope },
    Temp { name: String },
    Elem { name: String, scope: VarScope, indices: Vec<CExpr> },
    Call { name: String, args: Vec<CExpr> },
    Binary { op: BinOp, lhs: Box<CExpr>, rhs: Box<CExpr> },
    Unary { op: UnOp, operand: Box<CExpr> },
}

/// Where an assignment or INPUT result lands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum StoreRef {
    Var { name: String, scope: VarScope },
    Elem { name: String, scope: VarScope, indices: Vec<CExpr> },
    Temp { name: String },
}

/// One PRINT argument: a value to render or a separator marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PrintItem {
    Comma,
    Semicolon,
    Value { expr: CExpr },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputTarget {
    pub target: StoreRef,
    #[serde(rename = "type")]
    pub ty: TypeSpec,
}

/// Bounds of one dimension in a DIM instruction, evaluated at run time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimRange {
    pub lower: CExpr,
    pub upper: CExpr,
}

/// An executable instruction. The directive steering the trampoline is
/// implied by the variant: `Goto`/`Gosub`/`Return`/`End` always redirect,
/// `Branch` redirects when its condition's truthiness equals `jump_if`,
/// everything else falls through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Inst {
    Assign { target: StoreRef, value: CExpr },
    Branch { cond: CExpr, jump_if: bool, dest: String },
    Goto { dest: String },
    Gosub { dest: String },
    Return { dest: Option<String> },
    End,
    Print { items: Vec<PrintItem> },
    Input { prompt: String, targets: Vec<InputTarget> },
    Dim { name: String, scope: VarScope, element: TypeSpec, dims: Vec<DimRange> },
    DropTemps { names: Vec<String> },
}

/// One entry in a compiled statement list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum CompiledStmt {
    Label { label: String },
    Runnable { loc: Loc, inst: Inst },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledProc {
    pub name: String,
    pub params: Vec<SlotDef>,
    pub local_symbols: Vec<SlotDef>,
    pub return_type: TypeSpec,
    pub stmts: Vec<CompiledStmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledModule {
    pub source_file_name: String,
    pub local_symbols: Vec<SlotDef>,
    pub global_symbols: Vec<SlotDef>,
    pub stmts: Vec<CompiledStmt>,
    pub procs: Vec<CompiledProc>,
}

/// One line of the serialized module text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ModuleRecord {
    Header {
        source_file_name: String,
        local_symbols: Vec<SlotDef>,
        global_symbols: Vec<SlotDef>,
    },
    Proc {
        name: String,
        params: Vec<SlotDef>,
        local_symbols: Vec<SlotDef>,
        return_type: TypeSpec,
    },
    Stmt {
        stmt: CompiledStmt,
    },
}

impl CompiledModule {
    /// Flatten into the record stream: header, module statements, then one
    /// proc header followed by its statements, per proc.
    pub fn to_records(&self) -> Vec<ModuleRecord> {
        let mut records = Vec::new();
        records.push(ModuleRecord::Header {
            source_file_name: self.source_file_name.clone(),
            local_symbols: self.local_symbols.clone(),
            global_symbols: self.global_symbols.clone(),
        });
        for stmt in &self.stmts {
            records.push(ModuleRecord::Stmt { stmt: stmt.clone() });
        }
        for proc in &self.procs {
            records.push(ModuleRecord::Proc {
                name: proc.name.clone(),
                params: proc.params.clone(),
                local_symbols: proc.local_symbols.clone(),
                return_type: proc.return_type.clone(),
            });
            for stmt in &proc.stmts {
                records.push(ModuleRecord::Stmt { stmt: stmt.clone() });
            }
        }
        records
    }
}

/// Reassemble a module from its line-oriented record stream.
pub fn parse_module_source(code: &str) -> Result<CompiledModule, RuntimeError> {
    let mut module: Option<CompiledModule> = None;
    for (idx, line) in code.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: ModuleRecord = serde_json::from_str(line).map_err(|e| {
            RuntimeError::new(format!("malformed module record on line {}: {}", idx + 1, e))
        })?;
        match record {
            ModuleRecord::Header {
                source_file_name,
                local_symbols,
                global_symbols,
            } => {
                if module.is_some() {
                    return Err(RuntimeError::new("duplicate module header record"));
                }
                module = Some(CompiledModule {
                    source_file_name,
                    local_symbols,
                    global_symbols,
                    stmts: Vec::new(),
                    procs: Vec::new(),
                });
            }
            ModuleRecord::Proc {
                name,
                params,
                local_symbols,
                return_type,
            } => {
                let module = module
                    .as_mut()
                    .ok_or_else(|| RuntimeError::new("proc record before module header"))?;
                module.procs.push(CompiledProc {
                    name,
                    params,
                    local_symbols,
                    return_type,
                    stmts: Vec::new(),
                });
            }
            ModuleRecord::Stmt { stmt } => {
                let module = module
                    .as_mut()
                    .ok_or_else(|| RuntimeError::new("statement record before module header"))?;
                match module.procs.last_mut() {
                    Some(proc) => proc.stmts.push(stmt),
                    None => module.stmts.push(stmt),
                }
            }
        }
    }
    module.ok_or_else(|| RuntimeError::new("empty module source"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_module() -> CompiledModule {
        CompiledModule {
            source_file_name: "sample.bas".to_string(),
            local_symbols: vec![SlotDef {
                name: "x".to_string(),
                ty: TypeSpec::Single,
            }],
            global_symbols: vec![],
            stmts: vec![
                CompiledStmt::Label {
                    label: "start".to_string(),
                },
                CompiledStmt::Runnable {
                    loc: Loc::new(1, 1),
                    inst: Inst::Assign {
                        target: StoreRef::Var {
                            name: "x".to_string(),
                            scope: VarScope::Global,
                        },
                        value: CExpr::NumLit { value: 5.0 },
                    },
                },
                CompiledStmt::Runnable {
                    loc: Loc::new(2, 1),
                    inst: Inst::End,
                },
            ],
            procs: vec![CompiledProc {
                name: "f".to_string(),
                params: vec![SlotDef {
                    name: "n".to_string(),
                    ty: TypeSpec::Single,
                }],
                local_symbols: vec![SlotDef {
                    name: "f".to_string(),
                    ty: TypeSpec::Single,
                }],
                return_type: TypeSpec::Single,
                stmts: vec![CompiledStmt::Runnable {
                    loc: Loc::new(4, 3),
                    inst: Inst::Return { dest: None },
                }],
            }],
        }
    }

    #[test]
    fn records_round_trip_through_json_lines() {
        let module = sample_module();
        let code: String = module
            .to_records()
            .iter()
            .map(|r| serde_json::to_string(r).unwrap() + "\n")
            .collect();
        let reparsed = parse_module_source(&code).unwrap();
        assert_eq!(reparsed, module);
    }

    #[test]
    fn stmt_records_attach_to_the_open_proc() {
        let module = sample_module();
        let code: String = module
            .to_records()
            .iter()
            .map(|r| serde_json::to_string(r).unwrap() + "\n")
            .collect();
        let reparsed = parse_module_source(&code).unwrap();
        assert_eq!(reparsed.stmts.len(), 3);
        assert_eq!(reparsed.procs[0].stmts.len(), 1);
    }

    #[test]
    fn empty_source_is_rejected() {
        assert!(parse_module_source("").is_err());
    }

    #[test]
    fn garbage_line_is_rejected() {
        assert!(parse_module_source("not json\n").is_err());
    }

    #[test]
    fn loc_displays_line_and_col() {
        assert_eq!(Loc::new(12, 4).to_string(), "line 12, col 4");
    }
}
