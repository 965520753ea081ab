use std::borrow::Cow;
use std::future::Future;
use std::pin::Pin;

use log::warn;
use serde_json::{Map, Value};

use crate::context::{get_property, ValueRender, ValueTruthy};
use crate::engine::Engine;
use crate::errors::{Error, Result};
use crate::parser::ast::*;
use crate::renderer::call_stack::CallStack;
use crate::renderer::operators::{compare, eval_math, negate, Operand};
use crate::renderer::stack_frame::StackFrame;
use crate::renderer::RenderSession;
use crate::template::Template;
use crate::utils::escape_html;

/// Boxed so that bodies, loops and includes can recurse into each other
type RenderFuture<'b> = Pin<Box<dyn Future<Output = Result<String>> + Send + 'b>>;

/// Walks the AST of one template and renders it
pub struct Processor<'a> {
    /// The template we're rendering
    template: &'a Template,
    /// Filters, config and the way to load includes
    engine: &'a Engine,
    /// The call stack for looking up variables
    call_stack: CallStack,
    /// State shared with the templates this one includes
    session: &'a mut RenderSession,
}

impl<'a> Processor<'a> {
    /// Create a new `Processor` that will do the rendering
    pub fn new(
        template: &'a Template,
        engine: &'a Engine,
        call_stack: CallStack,
        session: &'a mut RenderSession,
    ) -> Self {
        Processor { template, engine, call_stack, session }
    }

    /// Entry point for the rendering. Raw html markers are left in the output,
    /// substituting them is up to the caller.
    pub async fn render(&mut self) -> Result<String> {
        let template = self.template;
        self.render_body(&template.ast).await
    }

    fn render_body<'b>(&'b mut self, body: &'b [Node]) -> RenderFuture<'b> {
        Box::pin(async move {
            let mut output = String::new();

            for node in body {
                self.render_node(node, &mut output).await?;
            }

            Ok(output)
        })
    }

    async fn render_node(&mut self, node: &Node, output: &mut String) -> Result<()> {
        match node {
            Node::Text(s) => output.push_str(s),
            Node::VariableBlock(expr) => {
                let value = self.eval_operand(expr)?;
                self.write_escaped(&value, output);
            }
            Node::RawHtml(name) => {
                if let Some(value) = self.call_stack.lookup(name) {
                    output.push_str(&value.render());
                }
            }
            Node::Set(set) => self.eval_set(set)?,
            Node::If(if_node) => self.render_if(if_node, output).await?,
            Node::Not(not) => {
                if !self.eval_condition(&not.condition) {
                    let rendered = self.render_body(&not.body).await?;
                    output.push_str(&rendered);
                }
            }
            Node::Each(each) => self.render_each(each, output).await?,
            Node::Include(path) => self.render_include(path, output).await?,
        };

        Ok(())
    }

    fn write_escaped(&self, value: &Operand, output: &mut String) {
        let rendered = value.render();
        if self.engine.config().autoescape {
            output.push_str(&escape_html(&rendered));
        } else {
            output.push_str(&rendered);
        }
    }

    /// Conditions never fail a render: an error counts as false
    fn eval_condition(&self, condition: &Expr) -> bool {
        match self.eval_operand(condition) {
            Ok(value) => value.is_truthy(),
            Err(e) => {
                warn!("Condition in '{}' failed to evaluate and is treated as false: {}", self.template.name, e);
                false
            }
        }
    }

    async fn render_if(&mut self, if_node: &If, output: &mut String) -> Result<()> {
        for (condition, body) in &if_node.conditions {
            if self.eval_condition(condition) {
                let rendered = self.render_body(body).await?;
                output.push_str(&rendered);
                return Ok(());
            }
        }

        if let Some(body) = &if_node.otherwise {
            let rendered = self.render_body(body).await?;
            output.push_str(&rendered);
        }

        Ok(())
    }

    async fn render_each(&mut self, each: &Each, output: &mut String) -> Result<()> {
        let container = self.eval_expression(&each.iterable)?;

        let items: Vec<(Option<String>, Value)> = match container {
            Value::Array(arr) => arr.into_iter().map(|v| (None, v)).collect(),
            Value::Object(map) => map.into_iter().map(|(k, v)| (Some(k), v)).collect(),
            Value::Null => return Ok(()),
            other => return Err(Error::not_iterable(other)),
        };

        for (index, (key, item)) in items.into_iter().enumerate() {
            self.call_stack.push(StackFrame::new(item, index, key));
            let rendered = self.render_body(&each.body).await;
            self.call_stack.pop();
            output.push_str(&rendered?);
        }

        Ok(())
    }

    async fn render_include(&mut self, path: &Expr, output: &mut String) -> Result<()> {
        let path = match self.eval_expression(path)? {
            Value::String(path) => path,
            other => return Err(Error::invalid_include_path(other)),
        };

        let data = self.call_stack.include_data();
        let frame = self.call_stack.current_frame().cloned();
        let rendered = self
            .engine
            .render_include(&path, data, frame, &mut *self.session)
            .await
            .map_err(|e| Error::include(&path, e))?;
        output.push_str(&rendered);

        Ok(())
    }

    fn eval_set(&mut self, set: &Set) -> Result<()> {
        let value = self.eval_expression(&set.value)?;

        let mut path = Vec::with_capacity(set.path.len());
        for accessor in &set.path {
            match accessor {
                Accessor::Property(name) => path.push(name.clone()),
                Accessor::Computed(expr) => match self.eval_expression(expr)? {
                    Value::String(key) => path.push(key),
                    Value::Number(n) => path.push(n.to_string()),
                    other => {
                        return Err(Error::msg(format!(
                            "Only strings and numbers can be used as keys in `#set`, got `{}`",
                            other
                        )))
                    }
                },
            }
        }

        let target = path.last().unwrap_or(&set.name);
        let value = if target.starts_with("html_") {
            Value::String(self.session.raw_html.store(&value))
        } else {
            value
        };

        self.call_stack.set_path(&set.name, &path, value)
    }

    /// Evaluates an expression down to a JSON value
    fn eval_expression(&self, expr: &Expr) -> Result<Value> {
        self.eval_operand(expr).map(Operand::into_value)
    }

    /// Evaluates an expression, keeping NaN and infinities as floats for the enclosing operators
    fn eval_operand(&self, expr: &Expr) -> Result<Operand> {
        let value = match expr {
            Expr::Literal(value) => value.clone(),
            Expr::Variable(name) | Expr::RawHtml(name) => {
                self.call_stack.lookup(name).cloned().unwrap_or(Value::Null)
            }
            Expr::Property { object, property } => {
                let object = self.eval_expression(object)?;
                get_property(&object, property).map(Cow::into_owned).unwrap_or(Value::Null)
            }
            Expr::ComputedProperty { object, property } => {
                let object = self.eval_expression(object)?;
                let found = match self.eval_expression(property)? {
                    Value::String(key) => get_property(&object, &key),
                    Value::Number(n) => get_property(&object, &n.to_string()),
                    _ => None,
                };
                found.map(Cow::into_owned).unwrap_or(Value::Null)
            }
            Expr::Unary { operator, right } => {
                let right = self.eval_operand(right)?;
                return match operator {
                    UnaryOperator::Not => Ok(Operand::Json(Value::Bool(!right.is_truthy()))),
                    UnaryOperator::Neg => negate(&right),
                };
            }
            Expr::Binary { operator, left, right } => {
                let left = self.eval_operand(left)?;
                let right = self.eval_operand(right)?;
                return eval_math(*operator, &left, &right);
            }
            Expr::Logical { operator, left, right } => {
                let left = self.eval_operand(left)?;
                return match (operator, left.is_truthy()) {
                    (LogicOperator::And, false) | (LogicOperator::Or, true) => Ok(left),
                    _ => self.eval_operand(right),
                };
            }
            Expr::Comparison { operator, left, right } => {
                let left = self.eval_operand(left)?;
                let right = self.eval_operand(right)?;
                Value::Bool(compare(*operator, &left, &right)?)
            }
            Expr::Ternary { condition, if_true, if_false } => {
                return if self.eval_operand(condition)?.is_truthy() {
                    self.eval_operand(if_true)
                } else {
                    self.eval_operand(if_false)
                };
            }
            Expr::Array(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval_expression(element)?);
                }
                Value::Array(values)
            }
            Expr::Object(properties) => {
                let mut map = Map::new();
                for (key, value) in properties {
                    map.insert(key.clone(), self.eval_expression(value)?);
                }
                Value::Object(map)
            }
            Expr::Filter { expression, filter } => self.eval_filter(expression, filter)?,
            Expr::IndexRef => self.call_stack.index().map(Value::from).unwrap_or(Value::Null),
            Expr::KeyRef => self.call_stack.key().map(Value::from).unwrap_or(Value::Null),
            Expr::This => self.call_stack.this().into_owned(),
        };

        Ok(Operand::Json(value))
    }

    /// Filters see the real content of `html_` values, their result is escaped like any other
    fn eval_filter(&self, expression: &Expr, call: &FilterCall) -> Result<Value> {
        let value = self.session.raw_html.resolve(self.eval_expression(expression)?);
        let filter = self.engine.filters().get(&call.name)?;

        let mut args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            args.push(self.session.raw_html.resolve(self.eval_expression(arg)?));
        }

        filter.filter(&value, &args).map_err(|e| Error::call_filter(&call.name, e))
    }
}
