// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Message catalogs and translation functions.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::locale::DEFAULT_LOCALE;

type Catalog = HashMap<&'static str, &'static str>;

const PT: &[(&str, &str)] = &[
	// Access policy
	("policy.authentication_required", "Faça login para acessar esta página."),
	("policy.permission_denied", "Você não tem permissão para acessar esta página."),
	("policy.staff_member_only", "Funcionários só podem gerenciar usuários do tipo 'Membro Comum'."),
	("policy.self_deletion", "Você não pode excluir sua própria conta."),
	// Books
	("book.created", "Livro '{title}' adicionado com sucesso!"),
	("book.updated", "Livro '{title}' atualizado com sucesso!"),
	("book.deleted", "Livro '{title}' excluído com sucesso!"),
	("book.save_failed", "Erro ao salvar o livro. Tente novamente."),
	("book.delete_failed", "Erro ao excluir o livro. Tente novamente."),
	// Users
	("user.created", "Usuário '{name}' criado com sucesso!"),
	("user.updated", "Usuário '{name}' atualizado com sucesso!"),
	("user.deleted", "Usuário '{name}' excluído com sucesso!"),
	("user.save_failed", "Erro ao salvar o usuário. Tente novamente."),
	("user.delete_failed", "Erro ao excluir o usuário. Tente novamente."),
	// Loans
	("loan.created", "Livro '{title}' emprestado para {name}. Devolução prevista: {due}."),
	("loan.unavailable", "O livro '{title}' não está disponível para empréstimo."),
	("loan.returned", "Livro '{title}' devolvido com sucesso!"),
	("loan.already_returned", "Este livro já foi devolvido."),
	("loan.updated", "Empréstimo atualizado com sucesso!"),
	("loan.save_failed", "Erro ao registrar o empréstimo. Tente novamente."),
	("loan.missing_selection", "Selecione um livro e um usuário."),
	// Session and registration
	("auth.registered", "Cadastro realizado com sucesso! Faça login para continuar."),
	("auth.registration_closed", "O cadastro de novos usuários está desativado."),
	("auth.login_failed", "Nome de usuário ou senha inválidos."),
	("auth.logged_in", "Bem-vindo(a), {name}!"),
	("auth.logged_out", "Você saiu do sistema."),
	// Validation
	("validation.form_invalid", "Por favor, corrija os erros abaixo."),
	("validation.required", "Este campo é obrigatório."),
	("validation.password.missing", "Por favor, informe a senha."),
	("validation.password_confirm.missing", "Por favor, confirme a senha."),
	("validation.password.mismatch", "As senhas não coincidem."),
	("validation.password.incomplete", "Preencha a senha e a confirmação para alterá-la."),
	("validation.login.taken", "Este nome de usuário já está em uso."),
	("validation.email.taken", "Este e-mail já está em uso."),
	("validation.email.invalid", "Informe um endereço de e-mail válido."),
	("validation.reference_id.taken", "Este identificador já está em uso."),
	("validation.secret_key.unexpected", "A chave secreta só é necessária para Administrador ou Funcionário."),
	("validation.secret_key.invalid", "Chave secreta inválida para o cargo escolhido."),
	("validation.role.member_only", "Funcionários só podem definir o cargo 'Membro Comum'."),
	("validation.year.invalid", "O ano de publicação deve ser um número inteiro."),
	("validation.not_found", "Registro selecionado não existe."),
	// Generic
	("error.not_found", "Registro não encontrado."),
	("error.storage", "Ocorreu um erro inesperado. Tente novamente."),
];

const EN: &[(&str, &str)] = &[
	("policy.authentication_required", "Please log in to access this page."),
	("policy.permission_denied", "You do not have permission to access this page."),
	("policy.staff_member_only", "Staff may only manage member accounts."),
	("policy.self_deletion", "You cannot delete your own account."),
	("book.created", "Book '{title}' added."),
	("book.updated", "Book '{title}' updated."),
	("book.deleted", "Book '{title}' deleted."),
	("book.save_failed", "Could not save the book. Please try again."),
	("book.delete_failed", "Could not delete the book. Please try again."),
	("user.created", "User '{name}' created."),
	("user.updated", "User '{name}' updated."),
	("user.deleted", "User '{name}' deleted."),
	("user.save_failed", "Could not save the user. Please try again."),
	("user.delete_failed", "Could not delete the user. Please try again."),
	("loan.created", "Book '{title}' lent to {name}. Due back: {due}."),
	("loan.unavailable", "The book '{title}' is not available for loan."),
	("loan.returned", "Book '{title}' returned."),
	("loan.already_returned", "This book has already been returned."),
	("loan.updated", "Loan updated."),
	("loan.save_failed", "Could not record the loan. Please try again."),
	("loan.missing_selection", "Select a book and a user."),
	("auth.registered", "Registration complete. Please log in."),
	("auth.registration_closed", "Self-registration is disabled."),
	("auth.login_failed", "Invalid username or password."),
	("auth.logged_in", "Welcome, {name}!"),
	("auth.logged_out", "You have been logged out."),
	("validation.form_invalid", "Please correct the errors below."),
	("validation.required", "This field is required."),
	("validation.password.missing", "Please enter a password."),
	("validation.password_confirm.missing", "Please confirm the password."),
	("validation.password.mismatch", "The passwords do not match."),
	("validation.password.incomplete", "Fill in both password fields to change it."),
	("validation.login.taken", "This username is already taken."),
	("validation.email.taken", "This email is already in use."),
	("validation.email.invalid", "Enter a valid email address."),
	("validation.reference_id.taken", "This identifier is already in use."),
	("validation.secret_key.unexpected", "A secret key is only needed for the admin or staff roles."),
	("validation.secret_key.invalid", "Invalid secret key for the selected role."),
	("validation.role.member_only", "Staff may only assign the member role."),
	("validation.year.invalid", "Publication year must be a whole number."),
	("validation.not_found", "The selected record does not exist."),
	("error.not_found", "Record not found."),
	("error.storage", "Something went wrong. Please try again."),
];

static CATALOGS: Lazy<HashMap<&'static str, Catalog>> = Lazy::new(|| {
	let mut map = HashMap::new();
	map.insert("pt", PT.iter().copied().collect::<Catalog>());
	map.insert("en", EN.iter().copied().collect::<Catalog>());
	tracing::trace!(locales = map.len(), "message catalogs loaded");
	map
});

/// Translate a message key for the given locale.
///
/// Falls back to [`DEFAULT_LOCALE`], then to the key itself.
pub fn t(locale: &str, key: &str) -> String {
	if let Some(msg) = CATALOGS.get(locale).and_then(|c| c.get(key)) {
		return (*msg).to_string();
	}

	if locale != DEFAULT_LOCALE {
		if let Some(msg) = CATALOGS.get(DEFAULT_LOCALE).and_then(|c| c.get(key)) {
			return (*msg).to_string();
		}
	}

	key.to_string()
}

/// Translate a message key and substitute `{name}` placeholders.
pub fn t_fmt(locale: &str, key: &str, args: &[(&str, &str)]) -> String {
	let mut result = t(locale, key);

	for (name, value) in args {
		let placeholder = format!("{{{name}}}");
		result = result.replace(&placeholder, value);
	}

	result
}
