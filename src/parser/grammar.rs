// Predictive recursive descent for the calc language, one method per
// production and a single token of lookahead. The right-recursive helper
// productions (expression', term', factor') build right-leaning operator
// chains; their callers graft the already-parsed left operand onto the
// chain's leftmost open slot, which restores left-associativity without
// left recursion. '^' alone re-invokes its own production on the right and
// stays right-associative.

use super::ast::{Operator, ParseTree};
use super::error::SyntaxError;
use super::tokenizer::{Tokenizer, TokenType as TT, Token};

pub struct Parser<'a> {
    lexer: Tokenizer<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(lexer: Tokenizer<'a>) -> Self {
        Self { lexer }
    }

    /// Parse a whole program, consuming the token stream.
    pub fn parse(&mut self) -> Result<ParseTree, SyntaxError> {
        self.lexer.next();
        let tree = self.parse_program()?;
        tracing::trace!(statements = tree.children.len(), "parsed program");
        Ok(tree)
    }

    /// True if the current token is of type `typ`.
    fn has(&self, typ: TT) -> bool {
        self.lexer.token().typ == typ
    }

    /// Fail with a syntax error unless the current token is of type `typ`.
    fn must_be(&self, typ: TT) -> Result<(), SyntaxError> {
        if self.has(typ) {
            return Ok(());
        }
        Err(SyntaxError::new(self.lexer.token().clone(), typ))
    }

    /// Consume the current token and return it.
    fn advance(&mut self) -> Token {
        let token = self.lexer.token().clone();
        self.lexer.next();
        token
    }

    // program := statement*
    fn parse_program(&mut self) -> Result<ParseTree, SyntaxError> {
        let mut result = ParseTree::new(Operator::Program);
        while !self.has(TT::Eof) {
            if let Some(statement) = self.parse_statement()? {
                result.add_right(statement);
            }
        }
        Ok(result)
    }

    // statement := NEWLINE
    //            | "input" ref
    //            | ("integer"|"real") id | array-decl | record-decl
    //            | if-stmt | while-stmt | fun-def
    //            | ref ( "=" expr | call-args? expr-tail? )
    //            | expr
    // Every statement runs to the end of its line.
    fn parse_statement(&mut self) -> Result<Option<ParseTree>, SyntaxError> {
        let result = if self.has(TT::Newline) {
            None
        } else if self.has(TT::Input) {
            Some(self.parse_input()?)
        } else if self.has(TT::Integer) || self.has(TT::Real) {
            Some(self.parse_var_decl()?)
        } else if self.has(TT::Array) {
            Some(self.parse_array_decl()?)
        } else if self.has(TT::Record) {
            Some(self.parse_record()?)
        } else if self.has(TT::If) {
            Some(self.parse_if()?)
        } else if self.has(TT::While) {
            Some(self.parse_while()?)
        } else if self.has(TT::Function) {
            Some(self.parse_fun_def()?)
        } else if self.has(TT::Id) {
            let mut result = self.parse_ref()?;
            if self.has(TT::LParen) && result.op == Operator::Var {
                result = self.parse_fun_call(result)?;
            }
            if let Some(mut tail) = self.parse_statement2()? {
                tail.graft_left(result);
                result = tail;
            }
            Some(result)
        } else {
            Some(self.parse_expression()?)
        };
        if !self.has(TT::Newline) {
            self.must_be(TT::Eof)?;
        }
        self.advance();
        Ok(result)
    }

    // statement' := "=" expr | expr-tail | ""
    // The tail chains leave their leftmost slot open; the caller grafts the
    // already-parsed reference (or call) into it.
    fn parse_statement2(&mut self) -> Result<Option<ParseTree>, SyntaxError> {
        if self.has(TT::Equal) {
            let token = self.advance();
            let mut result = ParseTree::with_token(Operator::Assign, token);
            result.add_right(self.parse_expression()?);
            return Ok(Some(result));
        }
        let mut result = self.parse_factor2()?;
        if let Some(mut chain) = self.parse_term2()? {
            if let Some(inner) = result.take() {
                chain.graft_left(inner);
            }
            result = Some(chain);
        }
        if let Some(mut chain) = self.parse_expression2()? {
            if let Some(inner) = result.take() {
                chain.graft_left(inner);
            }
            result = Some(chain);
        }
        Ok(result)
    }

    // input := "input" ref
    fn parse_input(&mut self) -> Result<ParseTree, SyntaxError> {
        let token = self.advance();
        let mut result = ParseTree::with_token(Operator::Input, token);
        result.add_right(self.parse_ref()?);
        Ok(result)
    }

    // var-decl := ("integer"|"real") id
    fn parse_var_decl(&mut self) -> Result<ParseTree, SyntaxError> {
        let token = self.advance();
        let mut result = ParseTree::with_token(Operator::Decl, token);
        self.must_be(TT::Id)?;
        result.add_right(ParseTree::with_token(Operator::Var, self.advance()));
        Ok(result)
    }

    // array-decl := "array" "of" ("integer"|"real"|"record" id)
    //               "with" "bounds" "[" bound ("," bound)* "]" id
    // The element type token rides on the node: integer, real, or the
    // record tag's identifier.
    fn parse_array_decl(&mut self) -> Result<ParseTree, SyntaxError> {
        self.advance();
        self.must_be(TT::Of)?;
        self.advance();
        let elem = if self.has(TT::Integer) || self.has(TT::Real) {
            self.advance()
        } else {
            self.must_be(TT::Record)?;
            self.advance();
            self.must_be(TT::Id)?;
            self.advance()
        };
        self.must_be(TT::With)?;
        self.advance();
        self.must_be(TT::Bounds)?;
        self.advance();
        self.must_be(TT::LBracket)?;
        self.advance();
        let mut bounds = ParseTree::new(Operator::Bounds);
        bounds.add_right(self.parse_bound()?);
        while self.has(TT::Comma) {
            self.advance();
            bounds.add_right(self.parse_bound()?);
        }
        self.must_be(TT::RBracket)?;
        self.advance();
        let mut result = ParseTree::with_token(Operator::ArrayDecl, elem);
        result.add_right(bounds);
        self.must_be(TT::Id)?;
        result.add_right(ParseTree::with_token(Operator::Var, self.advance()));
        Ok(result)
    }

    // bound := INT (".." INT)?
    fn parse_bound(&mut self) -> Result<ParseTree, SyntaxError> {
        self.must_be(TT::IntLit)?;
        let mut result = ParseTree::new(Operator::Bound);
        result.add_right(ParseTree::with_token(Operator::Lit, self.advance()));
        if self.has(TT::Bsep) {
            self.advance();
            self.must_be(TT::IntLit)?;
            result.add_right(ParseTree::with_token(Operator::Lit, self.advance()));
        }
        Ok(result)
    }

    // record-decl := "record" id ( id | NEWLINE field-decl* "end" )
    // One keyword, two constructs: a second identifier declares an
    // instance, a newline opens a type definition.
    fn parse_record(&mut self) -> Result<ParseTree, SyntaxError> {
        let keyword = self.advance();
        self.must_be(TT::Id)?;
        let tag = ParseTree::with_token(Operator::Var, self.advance());
        if self.has(TT::Id) {
            let mut result = ParseTree::with_token(Operator::RecDecl, keyword);
            result.add_right(tag);
            result.add_right(ParseTree::with_token(Operator::Var, self.advance()));
            return Ok(result);
        }
        self.must_be(TT::Newline)?;
        self.advance();
        let mut fields = ParseTree::new(Operator::FieldList);
        while !self.has(TT::End) {
            if self.has(TT::Newline) {
                self.advance();
                continue;
            }
            fields.add_right(self.parse_field_decl()?);
            if !self.has(TT::End) {
                self.must_be(TT::Newline)?;
                self.advance();
            }
        }
        self.advance();
        let mut result = ParseTree::with_token(Operator::RecDef, keyword);
        result.add_right(tag);
        result.add_right(fields);
        Ok(result)
    }

    // field-decl := var-decl | array-decl | "record" id id
    fn parse_field_decl(&mut self) -> Result<ParseTree, SyntaxError> {
        if self.has(TT::Integer) || self.has(TT::Real) {
            self.parse_var_decl()
        } else if self.has(TT::Array) {
            self.parse_array_decl()
        } else if self.has(TT::Record) {
            let keyword = self.advance();
            self.must_be(TT::Id)?;
            let tag = ParseTree::with_token(Operator::Var, self.advance());
            self.must_be(TT::Id)?;
            let mut result = ParseTree::with_token(Operator::RecDecl, keyword);
            result.add_right(tag);
            result.add_right(ParseTree::with_token(Operator::Var, self.advance()));
            Ok(result)
        } else {
            Err(SyntaxError::new(self.lexer.token().clone(), TT::End))
        }
    }

    // if-stmt := "if" expr NEWLINE statement* "end"
    fn parse_if(&mut self) -> Result<ParseTree, SyntaxError> {
        let keyword = self.advance();
        let mut result = ParseTree::with_token(Operator::If, keyword);
        result.add_right(self.parse_expression()?);
        result.add_right(self.parse_block()?);
        Ok(result)
    }

    // while-stmt := "while" expr NEWLINE statement* "end"
    fn parse_while(&mut self) -> Result<ParseTree, SyntaxError> {
        let keyword = self.advance();
        let mut result = ParseTree::with_token(Operator::While, keyword);
        result.add_right(self.parse_expression()?);
        result.add_right(self.parse_block()?);
        Ok(result)
    }

    // fun-def := "function" id "(" ( param ("," param)* )? ")"
    //            ("integer"|"real") NEWLINE statement* "end"
    fn parse_fun_def(&mut self) -> Result<ParseTree, SyntaxError> {
        let keyword = self.advance();
        let mut result = ParseTree::with_token(Operator::FunDef, keyword);
        self.must_be(TT::Id)?;
        result.add_right(ParseTree::with_token(Operator::Var, self.advance()));
        self.must_be(TT::LParen)?;
        self.advance();
        let mut params = ParseTree::new(Operator::ParamList);
        if !self.has(TT::RParen) {
            params.add_right(self.parse_param()?);
            while self.has(TT::Comma) {
                self.advance();
                params.add_right(self.parse_param()?);
            }
        }
        self.must_be(TT::RParen)?;
        self.advance();
        if !self.has(TT::Integer) {
            self.must_be(TT::Real)?;
        }
        result.add_right(params);
        result.add_right(ParseTree::with_token(Operator::Type, self.advance()));
        result.add_right(self.parse_block()?);
        Ok(result)
    }

    // param := ("integer"|"real") id | "ref" id
    fn parse_param(&mut self) -> Result<ParseTree, SyntaxError> {
        if self.has(TT::Integer) || self.has(TT::Real) {
            return self.parse_var_decl();
        }
        self.must_be(TT::Ref)?;
        let keyword = self.advance();
        let mut result = ParseTree::with_token(Operator::RefParam, keyword);
        self.must_be(TT::Id)?;
        result.add_right(ParseTree::with_token(Operator::Var, self.advance()));
        Ok(result)
    }

    // block := NEWLINE statement* "end"
    fn parse_block(&mut self) -> Result<ParseTree, SyntaxError> {
        self.must_be(TT::Newline)?;
        self.advance();
        let mut result = ParseTree::new(Operator::Block);
        while !self.has(TT::End) {
            if self.has(TT::Eof) {
                return Err(SyntaxError::new(self.lexer.token().clone(), TT::End));
            }
            if let Some(statement) = self.parse_statement()? {
                result.add_right(statement);
            }
        }
        self.advance();
        Ok(result)
    }

    // call-args := "(" ( expr ("," expr)* )? ")"
    fn parse_fun_call(&mut self, name: ParseTree) -> Result<ParseTree, SyntaxError> {
        self.advance();
        let mut args = ParseTree::new(Operator::ArgList);
        if !self.has(TT::RParen) {
            args.add_right(self.parse_expression()?);
            while self.has(TT::Comma) {
                self.advance();
                args.add_right(self.parse_expression()?);
            }
        }
        self.must_be(TT::RParen)?;
        self.advance();
        let mut result = ParseTree {
            op: Operator::FunCall,
            token: name.token.clone(),
            children: Vec::new(),
        };
        result.add_right(name);
        result.add_right(args);
        Ok(result)
    }

    // expr := term expr'
    fn parse_expression(&mut self) -> Result<ParseTree, SyntaxError> {
        let term = self.parse_term()?;
        match self.parse_expression2()? {
            Some(mut chain) => {
                chain.graft_left(term);
                Ok(chain)
            }
            None => Ok(term),
        }
    }

    // expr' := ("+"|"-") term expr' | ""
    fn parse_expression2(&mut self) -> Result<Option<ParseTree>, SyntaxError> {
        let op = if self.has(TT::Plus) {
            Operator::Add
        } else if self.has(TT::Minus) {
            Operator::Sub
        } else {
            return Ok(None);
        };
        let token = self.advance();
        let mut result = ParseTree::with_token(op, token);
        result.add_right(self.parse_term()?);
        match self.parse_expression2()? {
            Some(mut chain) => {
                chain.graft_left(result);
                Ok(Some(chain))
            }
            None => Ok(Some(result)),
        }
    }

    // term := factor term'
    fn parse_term(&mut self) -> Result<ParseTree, SyntaxError> {
        let factor = self.parse_factor()?;
        match self.parse_term2()? {
            Some(mut chain) => {
                chain.graft_left(factor);
                Ok(chain)
            }
            None => Ok(factor),
        }
    }

    // term' := ("*"|"/") factor term' | ""
    fn parse_term2(&mut self) -> Result<Option<ParseTree>, SyntaxError> {
        let op = if self.has(TT::Times) {
            Operator::Mul
        } else if self.has(TT::Divide) {
            Operator::Div
        } else {
            return Ok(None);
        };
        let token = self.advance();
        let mut result = ParseTree::with_token(op, token);
        result.add_right(self.parse_factor()?);
        match self.parse_term2()? {
            Some(mut chain) => {
                chain.graft_left(result);
                Ok(Some(chain))
            }
            None => Ok(Some(result)),
        }
    }

    // factor := atom factor'
    fn parse_factor(&mut self) -> Result<ParseTree, SyntaxError> {
        let atom = self.parse_exp()?;
        match self.parse_factor2()? {
            Some(mut result) => {
                result.add_left(atom);
                Ok(result)
            }
            None => Ok(atom),
        }
    }

    // factor' := "^" factor | ""
    fn parse_factor2(&mut self) -> Result<Option<ParseTree>, SyntaxError> {
        if !self.has(TT::Pow) {
            return Ok(None);
        }
        let token = self.advance();
        let mut result = ParseTree::with_token(Operator::Pow, token);
        result.add_right(self.parse_factor()?);
        Ok(Some(result))
    }

    // atom := "(" expr ")" | "-" atom | ref call-args? | INT | FLOAT
    fn parse_exp(&mut self) -> Result<ParseTree, SyntaxError> {
        if self.has(TT::LParen) {
            self.advance();
            let result = self.parse_expression()?;
            self.must_be(TT::RParen)?;
            self.advance();
            Ok(result)
        } else if self.has(TT::Minus) {
            let token = self.advance();
            let mut result = ParseTree::with_token(Operator::Neg, token);
            result.add_right(self.parse_exp()?);
            Ok(result)
        } else if self.has(TT::Id) {
            let reference = self.parse_ref()?;
            if self.has(TT::LParen) && reference.op == Operator::Var {
                return self.parse_fun_call(reference);
            }
            Ok(reference)
        } else if self.has(TT::IntLit) {
            Ok(ParseTree::with_token(Operator::Lit, self.advance()))
        } else {
            self.must_be(TT::FloatLit)?;
            Ok(ParseTree::with_token(Operator::Lit, self.advance()))
        }
    }

    // ref := id ("[" expr ("," expr)* "]")? ("." ref)?
    // A dotted suffix nests the recursively parsed inner reference to the
    // right of a record-access node.
    fn parse_ref(&mut self) -> Result<ParseTree, SyntaxError> {
        self.must_be(TT::Id)?;
        let token = self.advance();
        let mut result = if self.has(TT::LBracket) {
            self.advance();
            let mut array = ParseTree::with_token(Operator::ArrayVar, token);
            array.add_right(self.parse_expression()?);
            while self.has(TT::Comma) {
                self.advance();
                array.add_right(self.parse_expression()?);
            }
            self.must_be(TT::RBracket)?;
            self.advance();
            array
        } else {
            ParseTree::with_token(Operator::Var, token)
        };
        if self.has(TT::Dot) {
            let dot = self.advance();
            let mut access = ParseTree::with_token(Operator::RecAccess, dot);
            access.add_right(result);
            access.add_right(self.parse_ref()?);
            result = access;
        }
        Ok(result)
    }
}
