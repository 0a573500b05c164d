//! Trampoline executor for compiled modules.
//!
//! The loop walks a flat statement list, runs each instruction, and follows
//! the directive it yields: fall through, jump, gosub (push the resume
//! position), return (pop it), or end. Function calls inside expressions
//! run the callee's statement list in a fresh frame; the implicit local
//! named after the function is its return slot. A host stop flag is polled
//! between statements for cooperative cancellation.

use std::collections::HashMap;

use crate::array::QbArray;
use crate::builtins::lookup_builtin;
use crate::error::RuntimeError;
use crate::host::Host;
use crate::input;
use crate::print::{PrintArg, PrintState};
use crate::program::{
    CExpr, CompiledModule, CompiledProc, CompiledStmt, DimRange, Inst, Loc, PrintItem, StoreRef,
    UnOp, VarScope,
};
use crate::types::{DimSpec, TypeSpec};
use crate::value::{self, Value};

/// How a program run finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecOutcome {
    /// END was executed or the module statement list was exhausted.
    Ended,
    /// The host requested a stop between statements.
    Stopped,
}

/// Non-local exits threaded through evaluation. END inside a function body
/// must terminate the whole program, so it travels as a signal rather than
/// a directive.
enum Signal {
    Error(RuntimeError),
    Ended,
    Stopped,
}

impl From<RuntimeError> for Signal {
    fn from(e: RuntimeError) -> Self {
        Signal::Error(e)
    }
}

type Exec<T> = Result<T, Signal>;

enum Directive<'m> {
    Next,
    Jump(&'m str),
    Gosub(&'m str),
    Return(Option<&'m str>),
    End,
}

/// One activation record: module level or one function call.
#[derive(Default)]
struct Frame {
    vars: HashMap<String, Value>,
    params: HashMap<String, Value>,
    temps: HashMap<String, Value>,
    gosub_stack: Vec<usize>,
}

impl Frame {
    fn new() -> Self {
        Frame::default()
    }
}

pub struct Executor<'m, 'h> {
    module: &'m CompiledModule,
    host: &'h mut dyn Host,
    procs: HashMap<String, &'m CompiledProc>,
    globals: HashMap<String, Value>,
    print_state: PrintState,
}

impl<'m, 'h> Executor<'m, 'h> {
    pub fn new(module: &'m CompiledModule, host: &'h mut dyn Host) -> Self {
        let mut procs = HashMap::new();
        for proc in &module.procs {
            procs.insert(proc.name.to_ascii_lowercase(), proc);
        }
        // Module-level slots live in the global store; arrays are created
        // by their DIM instruction.
        let mut globals = HashMap::new();
        for def in module.local_symbols.iter().chain(&module.global_symbols) {
            if !def.ty.is_array() {
                globals.insert(def.name.clone(), Value::default_for(&def.ty));
            }
        }
        Executor {
            module,
            host,
            procs,
            globals,
            print_state: PrintState::new(),
        }
    }

    pub fn run(&mut self) -> Result<ExecOutcome, RuntimeError> {
        let module = self.module;
        let mut frame = Frame::new();
        match self.run_stmts(&module.stmts, &mut frame) {
            Ok(()) | Err(Signal::Ended) => Ok(ExecOutcome::Ended),
            Err(Signal::Stopped) => Ok(ExecOutcome::Stopped),
            Err(Signal::Error(e)) => Err(e),
        }
    }

    fn run_stmts(&mut self, stmts: &'m [CompiledStmt], frame: &mut Frame) -> Exec<()> {
        let labels = index_labels(stmts);
        let mut pc = 0;
        while pc < stmts.len() {
            if self.host.stop_requested() {
                return Err(Signal::Stopped);
            }
            match &stmts[pc] {
                CompiledStmt::Label { .. } => pc += 1,
                CompiledStmt::Runnable { loc, inst } => {
                    let directive = self.exec_inst(inst, frame).map_err(|sig| match sig {
                        Signal::Error(e) => Signal::Error(e.with_loc(*loc)),
                        other => other,
                    })?;
                    match directive {
                        Directive::Next => pc += 1,
                        Directive::Jump(dest) => pc = resolve(&labels, dest, *loc)?,
                        Directive::Gosub(dest) => {
                            frame.gosub_stack.push(pc + 1);
                            pc = resolve(&labels, dest, *loc)?;
                        }
                        Directive::Return(dest) => {
                            let resume = frame.gosub_stack.pop().ok_or_else(|| {
                                Signal::Error(RuntimeError::at("RETURN without GOSUB", *loc))
                            })?;
                            pc = match dest {
                                Some(dest) => resolve(&labels, dest, *loc)?,
                                None => resume,
                            };
                        }
                        Directive::End => return Err(Signal::Ended),
                    }
                }
            }
        }
        Ok(())
    }

    fn exec_inst(&mut self, inst: &'m Inst, frame: &mut Frame) -> Exec<Directive<'m>> {
        match inst {
            Inst::Assign { target, value } => {
                let v = self.eval(value, frame)?;
                self.store(target, v, frame)?;
                Ok(Directive::Next)
            }
            Inst::Branch {
                cond,
                jump_if,
                dest,
            } => {
                if self.eval(cond, frame)?.truthy() == *jump_if {
                    Ok(Directive::Jump(dest))
                } else {
                    Ok(Directive::Next)
                }
            }
            Inst::Goto { dest } => Ok(Directive::Jump(dest)),
            Inst::Gosub { dest } => Ok(Directive::Gosub(dest)),
            Inst::Return { dest } => Ok(Directive::Return(dest.as_deref())),
            Inst::End => Ok(Directive::End),
            Inst::Print { items } => {
                let mut args = Vec::with_capacity(items.len());
                for item in items {
                    args.push(match item {
                        PrintItem::Comma => PrintArg::Comma,
                        PrintItem::Semicolon => PrintArg::Semicolon,
                        PrintItem::Value { expr } => PrintArg::Value(self.eval(expr, frame)?),
                    });
                }
                self.print_state.print(&mut *self.host, &args)?;
                Ok(Directive::Next)
            }
            Inst::Input { prompt, targets } => {
                let types: Vec<TypeSpec> = targets.iter().map(|t| t.ty.clone()).collect();
                loop {
                    self.print_state.write(&mut *self.host, prompt);
                    let line = self.host.input_line()?;
                    self.print_state.reset_col();
                    match input::parse_response(&line, &types) {
                        Ok(values) => {
                            for (target, value) in targets.iter().zip(values) {
                                self.store(&target.target, value, frame)?;
                            }
                            break;
                        }
                        Err(_) => {
                            self.print_state.write(&mut *self.host, "Redo from start\n");
                        }
                    }
                }
                Ok(Directive::Next)
            }
            Inst::Dim {
                name,
                scope,
                element,
                dims,
            } => {
                let mut specs = Vec::with_capacity(dims.len());
                for DimRange { lower, upper } in dims {
                    let lo = self.eval(lower, frame)?.as_i64()?;
                    let hi = self.eval(upper, frame)?.as_i64()?;
                    specs.push(DimSpec::new(lo, hi));
                }
                let array = QbArray::new(element.clone(), specs)?;
                let value = Value::Array(std::rc::Rc::new(std::cell::RefCell::new(array)));
                self.slot_map(*scope, frame).insert(name.clone(), value);
                Ok(Directive::Next)
            }
            Inst::DropTemps { names } => {
                for name in names {
                    frame.temps.remove(name);
                }
                Ok(Directive::Next)
            }
        }
    }

    fn slot_map<'x>(
        &'x mut self,
        scope: VarScope,
        frame: &'x mut Frame,
    ) -> &'x mut HashMap<String, Value> {
        match scope {
            VarScope::Param => &mut frame.params,
            VarScope::Local => &mut frame.vars,
            VarScope::Global => &mut self.globals,
        }
    }

    fn read_slot(&self, name: &str, scope: VarScope, frame: &Frame) -> Exec<Value> {
        let map = match scope {
            VarScope::Param => &frame.params,
            VarScope::Local => &frame.vars,
            VarScope::Global => &self.globals,
        };
        map.get(name)
            .cloned()
            .ok_or_else(|| Signal::Error(RuntimeError::new(format!("unknown variable '{}'", name))))
    }

    fn eval(&mut self, expr: &'m CExpr, frame: &mut Frame) -> Exec<Value> {
        match expr {
            CExpr::NumLit { value } => Ok(Value::Single(*value as f32)),
            CExpr::StrLit { value } => Ok(Value::Str(value.clone())),
            CExpr::Var { name, scope } => self.read_slot(name, *scope, frame),
            CExpr::Temp { name } => frame.temps.get(name).cloned().ok_or_else(|| {
                Signal::Error(RuntimeError::new(format!("unknown temp '{}'", name)))
            }),
            CExpr::Elem {
                name,
                scope,
                indices,
            } => {
                let idxs = self.eval_indices(indices, frame)?;
                let slot = self.read_slot(name, *scope, frame).map_err(|_| {
                    Signal::Error(RuntimeError::new(format!("array '{}' is not dimensioned", name)))
                })?;
                let arr = slot.as_array()?.clone();
                let v = arr.borrow().get(&idxs)?;
                Ok(v)
            }
            CExpr::Call { name, args } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval(arg, frame)?);
                }
                if let Some(proc) = self.procs.get(name.as_str()).copied() {
                    return self.call_proc(proc, values);
                }
                let types: Vec<TypeSpec> = values.iter().map(|v| v.type_spec()).collect();
                let builtin = lookup_builtin(name, &types, true).ok_or_else(|| {
                    Signal::Error(RuntimeError::new(format!("unknown function '{}'", name)))
                })?;
                Ok((builtin.run)(&values)?)
            }
            CExpr::Binary { op, lhs, rhs } => {
                let a = self.eval(lhs, frame)?;
                let b = self.eval(rhs, frame)?;
                Ok(value::binary(*op, &a, &b)?)
            }
            CExpr::Unary { op, operand } => {
                let v = self.eval(operand, frame)?;
                match op {
                    UnOp::Neg => Ok(value::negate(&v)?),
                    UnOp::Not => Ok(value::logical_not(&v)?),
                }
            }
        }
    }

    fn eval_indices(&mut self, indices: &'m [CExpr], frame: &mut Frame) -> Exec<Vec<i64>> {
        let mut idxs = Vec::with_capacity(indices.len());
        for index in indices {
            idxs.push(self.eval(index, frame)?.as_i64()?);
        }
        Ok(idxs)
    }

    fn call_proc(&mut self, proc: &'m CompiledProc, args: Vec<Value>) -> Exec<Value> {
        if args.len() != proc.params.len() {
            return Err(Signal::Error(RuntimeError::new(format!(
                "wrong number of arguments for '{}'",
                proc.name
            ))));
        }
        let mut frame = Frame::new();
        for (def, arg) in proc.params.iter().zip(args) {
            frame.params.insert(def.name.clone(), arg.coerce_to(&def.ty)?);
        }
        for def in &proc.local_symbols {
            if !def.ty.is_array() {
                frame.vars.insert(def.name.clone(), Value::default_for(&def.ty));
            }
        }
        self.run_stmts(&proc.stmts, &mut frame)?;
        frame.vars.get(&proc.name).cloned().ok_or_else(|| {
            Signal::Error(RuntimeError::new(format!(
                "missing result slot for '{}'",
                proc.name
            )))
        })
    }

    fn store(&mut self, target: &'m StoreRef, value: Value, frame: &mut Frame) -> Exec<()> {
        match target {
            StoreRef::Var { name, scope } => {
                let coerced = {
                    let map = match scope {
                        VarScope::Param => &frame.params,
                        VarScope::Local => &frame.vars,
                        VarScope::Global => &self.globals,
                    };
                    match map.get(name) {
                        Some(existing) => value.coerce_to(&existing.type_spec())?,
                        None => value,
                    }
                };
                self.slot_map(*scope, frame).insert(name.clone(), coerced);
                Ok(())
            }
            StoreRef::Elem {
                name,
                scope,
                indices,
            } => {
                let idxs = self.eval_indices(indices, frame)?;
                let slot = self.read_slot(name, *scope, frame).map_err(|_| {
                    Signal::Error(RuntimeError::new(format!("array '{}' is not dimensioned", name)))
                })?;
                let arr = slot.as_array()?.clone();
                arr.borrow_mut().set(&idxs, &value)?;
                Ok(())
            }
            StoreRef::Temp { name } => {
                frame.temps.insert(name.clone(), value);
                Ok(())
            }
        }
    }
}

fn index_labels(stmts: &[CompiledStmt]) -> HashMap<&str, usize> {
    let mut labels = HashMap::new();
    for (idx, stmt) in stmts.iter().enumerate() {
        if let CompiledStmt::Label { label } = stmt {
            labels.insert(label.as_str(), idx);
        }
    }
    labels
}

fn resolve(labels: &HashMap<&str, usize>, dest: &str, loc: Loc) -> Exec<usize> {
    labels
        .get(dest)
        .copied()
        .ok_or_else(|| Signal::Error(RuntimeError::at(format!("unknown label '{}'", dest), loc)))
}
